use clap::Parser;
use divedraw_core::{PullView, ReelView, RngState, SlotMachine};
use divedraw_data::{load_items, load_machine_config_or_default};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "divedraw-web")]
#[command(about = "Serve the loadout slot machine")]
struct Args {
    #[arg(long, default_value = "0.0.0.0:7878")]
    bind: String,

    /// Dataset CSV
    #[arg(short, long, default_value = "helldivers_2_loadout_with_resized.csv")]
    data: PathBuf,

    /// Machine config JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding index.html, app.js and styles.css
    #[arg(long)]
    web_dir: Option<PathBuf>,

    /// Directory that contains `assets/`
    #[arg(long, default_value = ".")]
    root: PathBuf,

    #[arg(short, long)]
    verbose: bool,
}

struct AppState {
    machine: SlotMachine,
    seeds: RngState,
}

struct Dirs {
    web: PathBuf,
    root: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_machine_config_or_default(args.config.as_deref())?;
    let items = load_items(&args.data)?;
    let machine = SlotMachine::new(config, items)?;
    for (reel, size) in machine.pool_sizes() {
        if size == 0 {
            warn!(reel, "reel has no candidates; its slots will always be empty");
        }
    }
    let state = Mutex::new(AppState {
        machine,
        seeds: RngState::from_entropy(),
    });
    let dirs = Dirs {
        web: args.web_dir.unwrap_or_else(default_web_dir),
        root: args.root,
    };

    let server =
        Server::http(&args.bind).map_err(|err| anyhow::anyhow!("bind {}: {err}", args.bind))?;
    info!("divedraw web server on http://{}", args.bind);
    for request in server.incoming_requests() {
        if let Err(err) = handle_request(request, &state, &dirs) {
            warn!("request error: {err}");
        }
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}

fn default_web_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("web")
}

#[derive(Debug, Serialize)]
struct PullResponse {
    ok: bool,
    error: Option<String>,
    seed: Option<u64>,
    reels: Vec<ReelView>,
}

impl PullResponse {
    fn from_view(view: PullView) -> Self {
        Self {
            ok: true,
            error: None,
            seed: Some(view.seed),
            reels: view.reels,
        }
    }

    fn error(message: String) -> Self {
        Self {
            ok: false,
            error: Some(message),
            seed: None,
            reels: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ItemsResponse {
    count: usize,
    categories: BTreeMap<String, usize>,
}

enum Reply {
    File(PathBuf),
    Json(Vec<u8>),
    NotFound,
}

fn handle_request(
    request: Request,
    state: &Mutex<AppState>,
    dirs: &Dirs,
) -> Result<(), Box<dyn std::error::Error>> {
    let url = request.url().to_string();
    let (path, query) = split_url(&url);
    debug!(method = %request.method(), path, "request");
    let reply = match (request.method(), path) {
        (&Method::Get, "/") => Reply::File(dirs.web.join("index.html")),
        (&Method::Get, "/app.js") => Reply::File(dirs.web.join("app.js")),
        (&Method::Get, "/styles.css") => Reply::File(dirs.web.join("styles.css")),
        (&Method::Get, "/api/pull") => {
            let response = match parse_seed(query) {
                Ok(seed) => {
                    let mut guard = state.lock().map_err(|_| "state lock poisoned")?;
                    pull_response(&mut guard, seed)
                }
                Err(message) => PullResponse::error(message),
            };
            Reply::Json(serde_json::to_vec_pretty(&response)?)
        }
        (&Method::Get, "/api/items") => {
            let guard = state.lock().map_err(|_| "state lock poisoned")?;
            Reply::Json(serde_json::to_vec_pretty(&items_response(&guard.machine))?)
        }
        (&Method::Get, path) if path.starts_with("/assets/") => {
            resolve_static(&dirs.root, path).map_or(Reply::NotFound, Reply::File)
        }
        _ => Reply::NotFound,
    };
    send(request, reply)
}

fn send(request: Request, reply: Reply) -> Result<(), Box<dyn std::error::Error>> {
    match reply {
        Reply::File(path) => match std::fs::read(&path) {
            Ok(content) => {
                let header = Header::from_bytes(&b"Content-Type"[..], content_type_for(&path))
                    .map_err(|_| "invalid content type header")?;
                request.respond(Response::from_data(content).with_header(header))?;
            }
            Err(err) => {
                debug!(path = %path.display(), error = %err, "static file unavailable");
                request.respond(Response::empty(StatusCode(404)))?;
            }
        },
        Reply::Json(body) => {
            let header = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                .map_err(|_| "invalid content type header")?;
            request.respond(Response::from_data(body).with_header(header))?;
        }
        Reply::NotFound => request.respond(Response::empty(StatusCode(404)))?,
    }
    Ok(())
}

/// Every pull gets its own generator so the reported seed replays it.
fn pull_response(state: &mut AppState, seed: Option<u64>) -> PullResponse {
    let seed = seed.unwrap_or_else(|| state.seeds.next_u64());
    let pull = state.machine.pull(&mut RngState::from_seed(seed));
    info!(seed, empty = pull.empty_slots(), "pull");
    PullResponse::from_view(PullView::new(&state.machine, &pull))
}

fn items_response(machine: &SlotMachine) -> ItemsResponse {
    let mut categories = BTreeMap::new();
    for item in machine.items() {
        *categories.entry(item.category.trim().to_string()).or_insert(0) += 1;
    }
    ItemsResponse {
        count: machine.items().len(),
        categories,
    }
}

fn split_url(url: &str) -> (&str, Option<&str>) {
    match url.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (url, None),
    }
}

fn parse_seed(query: Option<&str>) -> Result<Option<u64>, String> {
    let Some(query) = query else {
        return Ok(None);
    };
    for pair in query.split('&') {
        if let Some(value) = pair.strip_prefix("seed=") {
            return value
                .parse::<u64>()
                .map(Some)
                .map_err(|_| format!("invalid seed: {value}"));
        }
    }
    Ok(None)
}

/// Maps a URL path onto a file under `root`, refusing anything that would
/// leave it.
fn resolve_static(root: &Path, url_path: &str) -> Option<PathBuf> {
    let relative = Path::new(url_path.trim_start_matches('/'));
    if relative
        .components()
        .any(|component| !matches!(component, Component::Normal(_)))
    {
        return None;
    }
    Some(root.join(relative))
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "html" => "text/html; charset=utf-8",
        "js" => "application/javascript",
        "css" => "text/css; charset=utf-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "csv" => "text/csv; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use divedraw_core::{Item, MachineConfig};

    fn state() -> AppState {
        let items = vec![
            Item::new("Weapon", "Primary", "", "Liberator"),
            Item::new("Weapon", "Secondary", "", "Peacemaker"),
            Item::new("Booster", "", "", "Vitality Enhancement"),
        ];
        AppState {
            machine: SlotMachine::new(MachineConfig::default(), items).expect("machine"),
            seeds: RngState::from_seed(1),
        }
    }

    #[test]
    fn seeds_parse_from_query() {
        assert_eq!(parse_seed(None), Ok(None));
        assert_eq!(parse_seed(Some("seed=42")), Ok(Some(42)));
        assert_eq!(parse_seed(Some("x=1&seed=7")), Ok(Some(7)));
        assert!(parse_seed(Some("seed=abc")).is_err());
        assert_eq!(split_url("/api/pull?seed=3"), ("/api/pull", Some("seed=3")));
    }

    #[test]
    fn static_paths_stay_under_root() {
        let root = Path::new("/srv/divedraw");
        assert_eq!(
            resolve_static(root, "/assets/images/resized/weapon/primary/liberator.png"),
            Some(PathBuf::from(
                "/srv/divedraw/assets/images/resized/weapon/primary/liberator.png"
            ))
        );
        assert_eq!(resolve_static(root, "/assets/../secrets.txt"), None);
        assert_eq!(content_type_for(Path::new("a/b.WEBP")), "image/webp");
        assert_eq!(content_type_for(Path::new("a/b")), "application/octet-stream");
    }

    #[test]
    fn seeded_pulls_are_reproducible() {
        let mut state = state();
        let first = pull_response(&mut state, Some(99));
        let second = pull_response(&mut state, Some(99));
        assert!(first.ok);
        assert_eq!(first.seed, Some(99));
        assert_eq!(
            serde_json::to_value(&first.reels).expect("json"),
            serde_json::to_value(&second.reels).expect("json")
        );
        let json = serde_json::to_value(&first).expect("json");
        assert_eq!(json["reels"][0]["slots"][0]["name"], "Liberator");
        assert_eq!(json["reels"][2]["slots"][0]["empty"], true);
    }

    #[test]
    fn item_summary_counts_categories() {
        let summary = items_response(&state().machine);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.categories.get("Weapon"), Some(&2));
        assert_eq!(summary.categories.get("Booster"), Some(&1));
    }
}
