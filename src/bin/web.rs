//! Single binary web server: public site from templates/ and /static, API via REST.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT, DATA_DIR.
//! Admin auth comes from ADMIN_PASSWORD_HASH + JWT_SECRET; publishing from
//! GITHUB_TOKEN/GITHUB_OWNER/GITHUB_REPO (+ optional GITHUB_BRANCH).
//!
//! `web hash-password <password>` prints a fresh ADMIN_PASSWORD_HASH value.

use actix_files::Files;
use actix_web::{
    delete, get, post, put,
    web::{self, Data, Json, Path},
    App, HttpRequest, HttpResponse, HttpServer, Responder,
};
use chrono::NaiveDate;
use pool_ladder_web::auth::{generate_password_hash, AuthError, AuthService};
use pool_ladder_web::persistence::{ladder_csv, load_chain, FileStore};
use pool_ladder_web::publish::{PublishConfig, Publisher};
use pool_ladder_web::{
    cancel_match, edit_match, move_down, move_up, recalculate_by_record, record_result, reorder,
    reset_all, schedule_match, LadderError, LadderStore, MatchEdit, MatchStatus, PlayerId,
};
use serde::Deserialize;
use std::sync::RwLock;

/// Shared server state: the single ladder plus its collaborators.
struct AppCtx {
    ladder: RwLock<LadderStore>,
    store: FileStore,
    auth: Option<AuthService>,
    publisher: Option<Publisher>,
}

type AppState = Data<AppCtx>;

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct LoginBody {
    password: String,
}

#[derive(Deserialize)]
struct VerifyBody {
    token: Option<String>,
}

#[derive(Deserialize)]
struct AddPlayerBody {
    name: String,
}

#[derive(Deserialize)]
struct RenamePlayerBody {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum MoveDirection {
    Up,
    Down,
}

#[derive(Deserialize)]
struct MovePlayerBody {
    direction: MoveDirection,
}

#[derive(Deserialize)]
struct OrderBody {
    #[serde(alias = "playerIds")]
    player_ids: Vec<PlayerId>,
}

#[derive(Deserialize)]
struct ScheduleMatchBody {
    #[serde(alias = "player1Id")]
    player1_id: PlayerId,
    #[serde(alias = "player2Id")]
    player2_id: PlayerId,
    date: NaiveDate,
}

#[derive(Deserialize)]
struct MatchResultBody {
    #[serde(alias = "player1Score")]
    player1_score: i64,
    #[serde(alias = "player2Score")]
    player2_score: i64,
}

#[derive(Deserialize)]
struct EditMatchBody {
    #[serde(alias = "player1Id")]
    player1_id: Option<PlayerId>,
    #[serde(alias = "player2Id")]
    player2_id: Option<PlayerId>,
    date: Option<NaiveDate>,
    status: Option<MatchStatus>,
    #[serde(alias = "player1Score")]
    player1_score: Option<i64>,
    #[serde(alias = "player2Score")]
    player2_score: Option<i64>,
}

#[derive(Deserialize)]
struct PublishBody {
    #[serde(alias = "commitMessage")]
    message: String,
}

/// Path segment: player id (e.g. /api/players/{id})
#[derive(Deserialize)]
struct PlayerPath {
    id: PlayerId,
}

/// Path segment: match id (e.g. /api/matches/{id})
#[derive(Deserialize)]
struct MatchPath {
    id: i64,
}

fn lock_error() -> HttpResponse {
    HttpResponse::InternalServerError().body("lock error")
}

/// Map a ladder error to a response carrying both a human-readable reason
/// and a stable machine-readable kind.
fn ladder_error(e: &LadderError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string(), "kind": e.kind() });
    match e.kind() {
        "not_found" => HttpResponse::NotFound().json(body),
        _ => HttpResponse::BadRequest().json(body),
    }
}

/// Full canonical snapshot, the response of every mutating endpoint.
fn snapshot(g: &LadderStore) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "players": g.players(),
        "matches": g.matches(),
    }))
}

/// Write the collections to disk; persistence failures surface as 500s.
fn persist(state: &AppCtx, g: &LadderStore) -> Result<(), HttpResponse> {
    state.store.save(g.players(), g.matches()).map_err(|e| {
        log::error!("Failed to save data files: {}", e);
        HttpResponse::InternalServerError()
            .json(serde_json::json!({ "error": format!("Failed to save data: {}", e) }))
    })
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("Authorization")?
        .to_str()
        .ok()
        .map(|h| h.trim_start_matches("Bearer ").to_string())
}

/// Require a valid admin token on mutating endpoints. When auth is not
/// configured the server runs open (local development mode).
fn authorize(state: &AppCtx, req: &HttpRequest) -> Result<(), HttpResponse> {
    let auth = match &state.auth {
        Some(a) => a,
        None => return Ok(()),
    };
    let token = bearer_token(req).ok_or_else(|| {
        HttpResponse::Unauthorized().json(serde_json::json!({ "error": "No token provided" }))
    })?;
    match auth.verify(&token) {
        Ok(_) => Ok(()),
        Err(AuthError::Forbidden) => Err(HttpResponse::Forbidden()
            .json(serde_json::json!({ "error": AuthError::Forbidden.to_string() }))),
        Err(e) => Err(HttpResponse::Unauthorized().json(serde_json::json!({ "error": e.to_string() }))),
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "pool-ladder-web",
    })
}

/// Avoid 404 in browser tab: favicon not required for app logic.
#[get("/favicon.ico")]
async fn favicon() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

/// Password login; issues a 24h admin bearer token.
#[post("/api/login")]
async fn api_login(state: AppState, req: HttpRequest, body: Json<LoginBody>) -> HttpResponse {
    let auth = match &state.auth {
        Some(a) => a,
        None => {
            return HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "error": "Server configuration incomplete",
                "details": "Contact administrator to set up authentication",
            }))
        }
    };
    let info = req.connection_info();
    let ip = info.realip_remote_addr().unwrap_or("unknown");
    match auth.login(ip, &body.password) {
        Ok(token) => HttpResponse::Ok().json(serde_json::json!({ "success": true, "token": token })),
        Err(e @ AuthError::RateLimited { .. }) => {
            log::warn!("Rate limit exceeded for {}", ip);
            HttpResponse::TooManyRequests().json(serde_json::json!({ "error": e.to_string() }))
        }
        Err(AuthError::BadPassword) => {
            log::warn!("Failed login attempt from {}", ip);
            HttpResponse::Unauthorized().json(serde_json::json!({ "error": "Invalid password" }))
        }
        Err(e) => {
            log::error!("Login failed: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({ "error": e.to_string() }))
        }
    }
}

/// Check a token (body or Authorization header) and report its claims.
#[post("/api/verify")]
async fn api_verify(state: AppState, req: HttpRequest, body: Option<Json<VerifyBody>>) -> HttpResponse {
    let auth = match &state.auth {
        Some(a) => a,
        None => {
            return HttpResponse::ServiceUnavailable()
                .json(serde_json::json!({ "error": "Server configuration incomplete" }))
        }
    };
    let token = body
        .and_then(|b| b.into_inner().token)
        .or_else(|| bearer_token(&req));
    let token = match token {
        Some(t) => t,
        None => {
            return HttpResponse::Unauthorized()
                .json(serde_json::json!({ "error": "No token provided" }))
        }
    };
    match auth.verify(&token) {
        Ok(claims) => HttpResponse::Ok().json(serde_json::json!({
            "valid": true,
            "role": claims.role,
            "expiresAt": claims.exp * 1000,
        })),
        Err(AuthError::Forbidden) => HttpResponse::Forbidden()
            .json(serde_json::json!({ "error": AuthError::Forbidden.to_string() })),
        Err(e) => HttpResponse::Unauthorized().json(serde_json::json!({ "error": e.to_string() })),
    }
}

/// Standings in rank order.
#[get("/api/players")]
async fn api_get_players(state: AppState) -> HttpResponse {
    let g = match state.ladder.read() {
        Ok(g) => g,
        Err(_) => return lock_error(),
    };
    HttpResponse::Ok().json(g.players())
}

/// All matches, scheduled and completed.
#[get("/api/matches")]
async fn api_get_matches(state: AppState) -> HttpResponse {
    let g = match state.ladder.read() {
        Ok(g) => g,
        Err(_) => return lock_error(),
    };
    HttpResponse::Ok().json(g.matches())
}

/// Standings as CSV, for download.
#[get("/api/ladder.csv")]
async fn api_ladder_csv(state: AppState) -> HttpResponse {
    let g = match state.ladder.read() {
        Ok(g) => g,
        Err(_) => return lock_error(),
    };
    match ladder_csv(g.players()) {
        Ok(csv) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .body(csv),
        Err(e) => {
            log::error!("CSV export failed: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({ "error": e.to_string() }))
        }
    }
}

/// Add a player at the bottom of the ladder.
#[post("/api/players")]
async fn api_add_player(state: AppState, req: HttpRequest, body: Json<AddPlayerBody>) -> HttpResponse {
    if let Err(resp) = authorize(&state, &req) {
        return resp;
    }
    let mut g = match state.ladder.write() {
        Ok(g) => g,
        Err(_) => return lock_error(),
    };
    if let Err(e) = g.add_player(&body.name) {
        return ladder_error(&e);
    }
    if let Err(resp) = persist(&state, &g) {
        return resp;
    }
    snapshot(&g)
}

/// Remove a player; remaining ranks re-compact with order preserved.
#[delete("/api/players/{id}")]
async fn api_remove_player(state: AppState, req: HttpRequest, path: Path<PlayerPath>) -> HttpResponse {
    if let Err(resp) = authorize(&state, &req) {
        return resp;
    }
    let mut g = match state.ladder.write() {
        Ok(g) => g,
        Err(_) => return lock_error(),
    };
    if let Err(e) = g.remove_player(path.id) {
        return ladder_error(&e);
    }
    if let Err(resp) = persist(&state, &g) {
        return resp;
    }
    snapshot(&g)
}

/// Rename a player (no-op when the trimmed name is unchanged).
#[put("/api/players/{id}/name")]
async fn api_rename_player(
    state: AppState,
    req: HttpRequest,
    path: Path<PlayerPath>,
    body: Json<RenamePlayerBody>,
) -> HttpResponse {
    if let Err(resp) = authorize(&state, &req) {
        return resp;
    }
    let mut g = match state.ladder.write() {
        Ok(g) => g,
        Err(_) => return lock_error(),
    };
    if let Err(e) = g.rename_player(path.id, &body.name) {
        return ladder_error(&e);
    }
    if let Err(resp) = persist(&state, &g) {
        return resp;
    }
    snapshot(&g)
}

/// Move a player up or down one rank (no-op at the edges).
#[put("/api/players/{id}/move")]
async fn api_move_player(
    state: AppState,
    req: HttpRequest,
    path: Path<PlayerPath>,
    body: Json<MovePlayerBody>,
) -> HttpResponse {
    if let Err(resp) = authorize(&state, &req) {
        return resp;
    }
    let mut g = match state.ladder.write() {
        Ok(g) => g,
        Err(_) => return lock_error(),
    };
    let result = match body.direction {
        MoveDirection::Up => move_up(&mut g, path.id),
        MoveDirection::Down => move_down(&mut g, path.id),
    };
    if let Err(e) = result {
        return ladder_error(&e);
    }
    if let Err(resp) = persist(&state, &g) {
        return resp;
    }
    snapshot(&g)
}

/// Apply a full drag-and-drop reordering (validated permutation).
#[put("/api/ladder/order")]
async fn api_reorder(state: AppState, req: HttpRequest, body: Json<OrderBody>) -> HttpResponse {
    if let Err(resp) = authorize(&state, &req) {
        return resp;
    }
    let mut g = match state.ladder.write() {
        Ok(g) => g,
        Err(_) => return lock_error(),
    };
    if let Err(e) = reorder(&mut g, &body.player_ids) {
        return ladder_error(&e);
    }
    if let Err(resp) = persist(&state, &g) {
        return resp;
    }
    snapshot(&g)
}

/// Re-rank everyone by win/loss record (overrides manual adjustments).
#[post("/api/ladder/recalculate")]
async fn api_recalculate(state: AppState, req: HttpRequest) -> HttpResponse {
    if let Err(resp) = authorize(&state, &req) {
        return resp;
    }
    let mut g = match state.ladder.write() {
        Ok(g) => g,
        Err(_) => return lock_error(),
    };
    recalculate_by_record(&mut g);
    if let Err(resp) = persist(&state, &g) {
        return resp;
    }
    snapshot(&g)
}

/// Zero all records and restore ranks to join order.
#[post("/api/ladder/reset")]
async fn api_reset(state: AppState, req: HttpRequest) -> HttpResponse {
    if let Err(resp) = authorize(&state, &req) {
        return resp;
    }
    let mut g = match state.ladder.write() {
        Ok(g) => g,
        Err(_) => return lock_error(),
    };
    reset_all(&mut g);
    if let Err(resp) = persist(&state, &g) {
        return resp;
    }
    snapshot(&g)
}

/// Schedule a match between two distinct players.
#[post("/api/matches")]
async fn api_schedule_match(
    state: AppState,
    req: HttpRequest,
    body: Json<ScheduleMatchBody>,
) -> HttpResponse {
    if let Err(resp) = authorize(&state, &req) {
        return resp;
    }
    let mut g = match state.ladder.write() {
        Ok(g) => g,
        Err(_) => return lock_error(),
    };
    if let Err(e) = schedule_match(&mut g, body.player1_id, body.player2_id, body.date) {
        return ladder_error(&e);
    }
    if let Err(resp) = persist(&state, &g) {
        return resp;
    }
    snapshot(&g)
}

/// Cancel a scheduled match (completed matches can only be edited).
#[delete("/api/matches/{id}")]
async fn api_cancel_match(state: AppState, req: HttpRequest, path: Path<MatchPath>) -> HttpResponse {
    if let Err(resp) = authorize(&state, &req) {
        return resp;
    }
    let mut g = match state.ladder.write() {
        Ok(g) => g,
        Err(_) => return lock_error(),
    };
    if let Err(e) = cancel_match(&mut g, path.id) {
        return ladder_error(&e);
    }
    if let Err(resp) = persist(&state, &g) {
        return resp;
    }
    snapshot(&g)
}

/// Record a result: completes the match and settles win/loss stats.
#[post("/api/matches/{id}/result")]
async fn api_record_result(
    state: AppState,
    req: HttpRequest,
    path: Path<MatchPath>,
    body: Json<MatchResultBody>,
) -> HttpResponse {
    if let Err(resp) = authorize(&state, &req) {
        return resp;
    }
    let mut g = match state.ladder.write() {
        Ok(g) => g,
        Err(_) => return lock_error(),
    };
    if let Err(e) = record_result(&mut g, path.id, body.player1_score, body.player2_score) {
        return ladder_error(&e);
    }
    if let Err(resp) = persist(&state, &g) {
        return resp;
    }
    snapshot(&g)
}

/// Edit a match; settlement is corrected as a delta, never double-counted.
#[put("/api/matches/{id}")]
async fn api_edit_match(
    state: AppState,
    req: HttpRequest,
    path: Path<MatchPath>,
    body: Json<EditMatchBody>,
) -> HttpResponse {
    if let Err(resp) = authorize(&state, &req) {
        return resp;
    }
    let body = body.into_inner();
    let edit = MatchEdit {
        player1_id: body.player1_id,
        player2_id: body.player2_id,
        date: body.date,
        status: body.status,
        player1_score: body.player1_score,
        player2_score: body.player2_score,
    };
    let mut g = match state.ladder.write() {
        Ok(g) => g,
        Err(_) => return lock_error(),
    };
    if let Err(e) = edit_match(&mut g, path.id, edit) {
        return ladder_error(&e);
    }
    if let Err(resp) = persist(&state, &g) {
        return resp;
    }
    snapshot(&g)
}

/// Publish the current snapshot to the configured GitHub repository.
#[post("/api/publish")]
async fn api_publish(state: AppState, req: HttpRequest, body: Json<PublishBody>) -> HttpResponse {
    if let Err(resp) = authorize(&state, &req) {
        return resp;
    }
    if body.message.trim().is_empty() {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({ "error": "Missing required fields" }));
    }
    let publisher = match &state.publisher {
        Some(p) => p,
        None => {
            return HttpResponse::ServiceUnavailable()
                .json(serde_json::json!({ "error": "Publishing is not configured" }))
        }
    };
    // Snapshot under the lock, publish outside it.
    let (players, matches) = {
        let g = match state.ladder.read() {
            Ok(g) => g,
            Err(_) => return lock_error(),
        };
        (g.players().to_vec(), g.matches().to_vec())
    };
    match publisher.publish(&players, &matches, body.message.trim()).await {
        Ok(receipt) => {
            HttpResponse::Ok().json(serde_json::json!({ "success": true, "commit": receipt }))
        }
        Err(e) => {
            log::error!("Publish failed: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to publish changes",
                "details": e.to_string(),
            }))
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Utility mode: print a fresh ADMIN_PASSWORD_HASH value and exit.
    let mut args = std::env::args().skip(1);
    if let Some("hash-password") = args.next().as_deref() {
        match args.next() {
            Some(password) => {
                println!("{}", generate_password_hash(&password));
                return Ok(());
            }
            None => {
                eprintln!("usage: web hash-password <password>");
                std::process::exit(2);
            }
        }
    }

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string());

    // Ordered source chain: live data dir first, then the shipped seed data.
    let store = FileStore::new(&data_dir);
    let seed = FileStore::new("seed");
    let data = load_chain(&[&store, &seed]);
    let ladder = LadderStore::from_parts(data.players, data.matches);

    let auth = AuthService::from_env();
    if auth.is_none() {
        log::warn!("ADMIN_PASSWORD_HASH/JWT_SECRET not set: admin API is open (dev mode)");
    }
    let publisher = PublishConfig::from_env().map(Publisher::new);
    if publisher.is_none() {
        log::warn!("GITHUB_TOKEN/GITHUB_OWNER/GITHUB_REPO not set: publishing disabled");
    }

    let state = Data::new(AppCtx {
        ladder: RwLock::new(ladder),
        store,
        auth,
        publisher,
    });

    log::info!("Starting server at http://{}:{}", host, port);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/", web::get().to(serve_index_async))
            .service(api_health)
            .service(favicon)
            .service(api_login)
            .service(api_verify)
            .service(api_get_players)
            .service(api_get_matches)
            .service(api_ladder_csv)
            .service(api_add_player)
            .service(api_remove_player)
            .service(api_rename_player)
            .service(api_move_player)
            .service(api_reorder)
            .service(api_recalculate)
            .service(api_reset)
            .service(api_schedule_match)
            .service(api_cancel_match)
            .service(api_record_result)
            .service(api_edit_match)
            .service(api_publish)
            .service(Files::new("/static", "static"))
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}

async fn serve_index_async() -> HttpResponse {
    let html = include_str!("../../templates/index.html");
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html)
}
