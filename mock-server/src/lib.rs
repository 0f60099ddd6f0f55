//! A stand-in for the Desktoppr API, good enough to drive the client end to
//! end. State lives in memory and starts from [`World::seed`].

use actix_web::http::StatusCode;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{
    App, HttpRequest, HttpResponse, HttpResponseBuilder, HttpServer, delete, get, post, web,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::{debug, info};
use parking_lot::{Mutex, MutexGuard};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

pub const PER_PAGE: usize = 2;

/// Every read about this user fails with 500.
pub const BROKEN_USER: &str = "broken";

/// Reads about this user answer 200 with a body the client can't use: the
/// profile is not JSON and the collection lacks its pagination.
pub const GARBLED_USER: &str = "garbled";

#[derive(Debug, Clone)]
pub struct Account {
    pub username: String,
    pub name: String,
    pub password: String,
    pub api_token: String,
    pub lifetime_member: bool,
    pub created_at: String,
    pub following: BTreeSet<String>,
    pub likes: BTreeSet<u64>,
    pub selection: BTreeSet<u64>,
}

impl Account {
    fn new(username: &str, name: &str, password: &str, api_token: &str) -> Self {
        Self {
            username: username.into(),
            name: name.into(),
            password: password.into(),
            api_token: api_token.into(),
            lifetime_member: false,
            created_at: "2012-03-27T05:48:42Z".into(),
            following: BTreeSet::new(),
            likes: BTreeSet::new(),
            selection: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Paper {
    pub id: u64,
    pub width: u32,
    pub height: u32,
    pub bytes: u64,
    pub review_state: &'static str,
    pub uploader: Option<String>,
    pub flags: Vec<String>,
}

#[derive(Debug, Default)]
pub struct World {
    pub accounts: BTreeMap<String, Account>,
    pub wallpapers: BTreeMap<u64, Paper>,
}

impl World {
    pub fn seed() -> Self {
        let mut keith = Account::new("keithpitt", "Keith Pitt", "hunter2", "keith-token");
        keith.lifetime_member = true;
        keith.selection.extend([100, 101, 102]);
        keith.likes.extend([101, 103]);
        keith.following.insert("bob".into());

        let mut alice = Account::new("alice", "Alice Liddell", "wonderland", "alice-token");
        alice.following.insert("keithpitt".into());
        let mut bob = Account::new("bob", "Bob", "builder", "bob-token");
        bob.following.insert("keithpitt".into());
        let carol = Account::new("carol", "Carol", "carol", "carol-token");

        let mut world = World::default();
        for account in [keith, alice, bob, carol] {
            world.accounts.insert(account.username.clone(), account);
        }

        let papers = [
            (100, "safe", Some("keithpitt")),
            (101, "safe", Some("alice")),
            (102, "pending", Some("keithpitt")),
            (103, "not_safe", Some("bob")),
            (104, "safe", None),
            (105, "pending", Some("alice")),
            (106, "safe", Some("keithpitt")),
        ];
        for (id, review_state, uploader) in papers {
            world.wallpapers.insert(
                id,
                Paper {
                    id,
                    width: 1920,
                    height: 1200,
                    bytes: 400_000 + id,
                    review_state,
                    uploader: uploader.map(Into::into),
                    flags: Vec::new(),
                },
            );
        }
        world
    }

    fn by_token(&self, token: Option<&str>) -> Option<&Account> {
        let token = token?;
        self.accounts.values().find(|a| a.api_token == token)
    }

    fn by_password(&self, username: &str, password: &str) -> Option<&Account> {
        self.accounts
            .get(username)
            .filter(|a| a.password == password)
    }

    fn followers_of(&self, username: &str) -> Vec<&Account> {
        self.accounts
            .values()
            .filter(|a| a.following.contains(username))
            .collect()
    }

    fn user_json(&self, account: &Account) -> Value {
        let uploaded = self
            .wallpapers
            .values()
            .filter(|p| p.uploader.as_deref() == Some(&account.username))
            .count();
        json!({
            "username": account.username,
            "name": account.name,
            "avatar_url": format!("https://a.desktoppr.co/avatars/{}.png", account.username),
            "wallpapers_count": account.selection.len(),
            "uploaded_count": uploaded,
            "followers_count": self.followers_of(&account.username).len(),
            "following_count": account.following.len(),
            "created_at": account.created_at,
            "lifetime_member": account.lifetime_member,
        })
    }

    fn paper_json(&self, paper: &Paper) -> Value {
        let base = format!("https://a.desktoppr.co/wallpapers/{}", paper.id);
        let liked_by = self
            .accounts
            .values()
            .filter(|a| a.likes.contains(&paper.id))
            .count();
        let holders = self
            .accounts
            .values()
            .filter(|a| a.selection.contains(&paper.id))
            .count();
        json!({
            "id": paper.id,
            "width": paper.width,
            "height": paper.height,
            "bytes": paper.bytes,
            "review_state": paper.review_state,
            "likes_count": liked_by,
            "user_count": holders,
            "palette": ["#1d2b3c", "#e0d4c2"],
            "created_at": "2013-02-10T03:22:15Z",
            "uploader": paper.uploader,
            "url": format!("https://www.desktoppr.co/wallpapers/{}", paper.id),
            "image": {
                "url": format!("{base}/full.jpg"),
                "thumb": {"url": format!("{base}/thumb.jpg"), "width": 296, "height": 185},
                "preview": {"url": format!("{base}/preview.jpg"), "width": 960, "height": 600},
            },
        })
    }

    fn papers_json<'a>(&self, ids: impl IntoIterator<Item = &'a u64>) -> Vec<Value> {
        ids.into_iter()
            .filter_map(|id| self.wallpapers.get(id))
            .map(|p| self.paper_json(p))
            .collect()
    }
}

/// Shared server state.
#[derive(Debug)]
pub struct Mock {
    world: Mutex<World>,
    hits: AtomicUsize,
}

impl Mock {
    pub fn new(world: World) -> Self {
        Self {
            world: Mutex::new(world),
            hits: AtomicUsize::new(0),
        }
    }

    /// Every handler goes through here, so this also counts requests.
    fn enter(&self) -> MutexGuard<'_, World> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        self.world.lock()
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn world(&self) -> MutexGuard<'_, World> {
        self.world.lock()
    }
}

#[derive(Deserialize, Debug, Default)]
struct Params {
    auth_token: Option<String>,
    page: Option<usize>,
    safe_filter: Option<String>,
    wallpaper_id: Option<u64>,
}

fn respond(st: StatusCode, error: &str) -> HttpResponse {
    HttpResponseBuilder::new(st).json(json!({ "error": error }))
}

fn one(response: Value) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "response": response }))
}

fn paged(items: Vec<Value>, page: Option<usize>) -> HttpResponse {
    let page = page.unwrap_or(1).max(1);
    let pages = items.len().div_ceil(PER_PAGE).max(1);
    let slice: Vec<Value> = items
        .into_iter()
        .skip((page - 1).saturating_mul(PER_PAGE))
        .take(PER_PAGE)
        .collect();
    HttpResponse::Ok().json(json!({
        "response": slice,
        "count": slice.len(),
        "pagination": {
            "current": page,
            "previous": (page > 1).then(|| page - 1),
            "next": (page < pages).then(|| page + 1),
            "per_page": PER_PAGE,
            "pages": pages,
        },
    }))
}

fn filtered(items: Vec<Value>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "count": items.len(),
        "response": items,
    }))
}

fn states_for(filter: Option<&str>) -> Option<&'static [&'static str]> {
    match filter.unwrap_or("safe") {
        "safe" => Some(&["safe"][..]),
        "include_pending" => Some(&["safe", "pending"][..]),
        "all" => Some(&["safe", "pending", "not_safe"][..]),
        _ => None,
    }
}

fn basic_auth(req: &HttpRequest) -> Option<(String, String)> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = String::from_utf8(STANDARD.decode(encoded).ok()?).ok()?;
    let (name, pass) = decoded.split_once(':')?;
    Some((name.to_owned(), pass.to_owned()))
}

/// Looks up a user for a read, or the response to send instead.
fn reader<'a>(world: &'a World, username: &str) -> Result<&'a Account, HttpResponse> {
    if username == BROKEN_USER {
        return Err(respond(StatusCode::INTERNAL_SERVER_ERROR, "internal error"));
    }
    if username == GARBLED_USER {
        return Err(HttpResponse::Ok()
            .content_type("text/html")
            .body("<html>down for maintenance</html>"));
    }
    world
        .accounts
        .get(username)
        .ok_or_else(|| respond(StatusCode::NOT_FOUND, "user not found"))
}

fn authed(world: &World, params: &Params) -> Result<String, HttpResponse> {
    world
        .by_token(params.auth_token.as_deref())
        .map(|a| a.username.clone())
        .ok_or_else(|| respond(StatusCode::UNAUTHORIZED, "invalid auth_token"))
}

pub type Data = web::Data<Mock>;

#[get("/user/whoami")]
async fn whoami(app: Data, req: HttpRequest, params: web::Query<Params>) -> HttpResponse {
    let world = app.enter();
    let account = match basic_auth(&req) {
        Some((name, pass)) => world.by_password(&name, &pass),
        None => world.by_token(params.auth_token.as_deref()),
    };
    match account {
        Some(account) => {
            let mut body = world.user_json(account);
            body["api_token"] = json!(account.api_token);
            one(body)
        }
        None => respond(StatusCode::UNAUTHORIZED, "invalid credentials"),
    }
}

#[get("/users/{username}")]
async fn user(app: Data, path: web::Path<String>) -> HttpResponse {
    let world = app.enter();
    match reader(&world, &path) {
        Ok(account) => one(world.user_json(account)),
        Err(resp) => resp,
    }
}

#[get("/users/{username}/wallpapers")]
async fn collection(app: Data, path: web::Path<String>, params: web::Query<Params>) -> HttpResponse {
    let world = app.enter();
    if path.as_str() == GARBLED_USER {
        return HttpResponse::Ok().json(json!({ "response": [{ "id": 1 }] }));
    }
    let account = match reader(&world, &path) {
        Ok(account) => account,
        Err(resp) => return resp,
    };
    match params.wallpaper_id {
        Some(id) => {
            let ids = account.selection.iter().filter(|i| **i == id);
            filtered(world.papers_json(ids))
        }
        None => paged(world.papers_json(&account.selection), params.page),
    }
}

#[get("/users/{username}/wallpapers/random")]
async fn user_random(app: Data, path: web::Path<String>) -> HttpResponse {
    let world = app.enter();
    let account = match reader(&world, &path) {
        Ok(account) => account,
        Err(resp) => return resp,
    };
    let ids: Vec<&u64> = account.selection.iter().collect();
    if ids.is_empty() {
        return respond(StatusCode::NOT_FOUND, "no wallpapers");
    }
    let id = ids[app.hits() % ids.len()];
    one(world.paper_json(&world.wallpapers[id]))
}

#[get("/users/{username}/followers")]
async fn followers(app: Data, path: web::Path<String>, params: web::Query<Params>) -> HttpResponse {
    let world = app.enter();
    if let Err(resp) = reader(&world, &path) {
        return resp;
    }
    let users = world
        .followers_of(&path)
        .into_iter()
        .map(|a| world.user_json(a))
        .collect();
    paged(users, params.page)
}

#[get("/users/{username}/following")]
async fn following(app: Data, path: web::Path<String>, params: web::Query<Params>) -> HttpResponse {
    let world = app.enter();
    let account = match reader(&world, &path) {
        Ok(account) => account,
        Err(resp) => return resp,
    };
    let users = account
        .following
        .iter()
        .filter_map(|u| world.accounts.get(u))
        .map(|a| world.user_json(a))
        .collect();
    paged(users, params.page)
}

#[get("/users/{username}/likes")]
async fn likes(app: Data, path: web::Path<String>, params: web::Query<Params>) -> HttpResponse {
    let world = app.enter();
    let account = match reader(&world, &path) {
        Ok(account) => account,
        Err(resp) => return resp,
    };
    match params.wallpaper_id {
        Some(id) => {
            let ids = account.likes.iter().filter(|i| **i == id);
            filtered(world.papers_json(ids))
        }
        None => paged(world.papers_json(&account.likes), params.page),
    }
}

fn update_follow(app: &Data, target: &str, params: &Params, on: bool) -> HttpResponse {
    let mut world = app.enter();
    let me = match authed(&world, params) {
        Ok(me) => me,
        Err(resp) => return resp,
    };
    if !world.accounts.contains_key(target) {
        return respond(StatusCode::NOT_FOUND, "user not found");
    }
    if me == target {
        return respond(StatusCode::UNPROCESSABLE_ENTITY, "cannot follow yourself");
    }
    let Some(account) = world.accounts.get_mut(&me) else {
        return respond(StatusCode::INTERNAL_SERVER_ERROR, "session lost");
    };
    let changed = if on {
        account.following.insert(target.to_owned());
        true
    } else {
        account.following.remove(target)
    };
    if changed {
        info!("{me} {} {target}", if on { "follows" } else { "unfollows" });
        one(json!({ "username": target }))
    } else {
        respond(StatusCode::NOT_FOUND, "not following")
    }
}

#[post("/users/{username}/follow")]
async fn follow(app: Data, path: web::Path<String>, params: web::Query<Params>) -> HttpResponse {
    update_follow(&app, &path, &params, true)
}

#[delete("/users/{username}/follow")]
async fn unfollow(app: Data, path: web::Path<String>, params: web::Query<Params>) -> HttpResponse {
    update_follow(&app, &path, &params, false)
}

#[derive(Clone, Copy, Debug)]
enum Shelf {
    Likes,
    Selection,
}

/// Adds or removes a wallpaper on one of the caller's shelves. Adding twice
/// is 422, removing something absent is 404.
fn update_shelf(app: &Data, id: u64, params: &Params, shelf: Shelf, add: bool) -> HttpResponse {
    let mut world = app.enter();
    let me = match authed(&world, params) {
        Ok(me) => me,
        Err(resp) => return resp,
    };
    if !world.wallpapers.contains_key(&id) {
        return respond(StatusCode::NOT_FOUND, "wallpaper not found");
    }
    let Some(account) = world.accounts.get_mut(&me) else {
        return respond(StatusCode::INTERNAL_SERVER_ERROR, "session lost");
    };
    let set = match shelf {
        Shelf::Likes => &mut account.likes,
        Shelf::Selection => &mut account.selection,
    };
    debug!("{me}: {shelf:?} {} {id}", if add { "+" } else { "-" });
    match (add, if add { set.insert(id) } else { set.remove(&id) }) {
        (_, true) => {
            let body = world.paper_json(&world.wallpapers[&id]);
            one(body)
        }
        (true, false) => respond(StatusCode::UNPROCESSABLE_ENTITY, "already there"),
        (false, false) => respond(StatusCode::NOT_FOUND, "not there"),
    }
}

#[post("/user/wallpapers/{id}/like")]
async fn like(app: Data, path: web::Path<u64>, params: web::Query<Params>) -> HttpResponse {
    update_shelf(&app, *path, &params, Shelf::Likes, true)
}

#[delete("/user/wallpapers/{id}/like")]
async fn unlike(app: Data, path: web::Path<u64>, params: web::Query<Params>) -> HttpResponse {
    update_shelf(&app, *path, &params, Shelf::Likes, false)
}

#[post("/user/wallpapers/{id}/selection")]
async fn sync(app: Data, path: web::Path<u64>, params: web::Query<Params>) -> HttpResponse {
    update_shelf(&app, *path, &params, Shelf::Selection, true)
}

#[delete("/user/wallpapers/{id}/selection")]
async fn unsync(app: Data, path: web::Path<u64>, params: web::Query<Params>) -> HttpResponse {
    update_shelf(&app, *path, &params, Shelf::Selection, false)
}

fn listed<'a>(world: &'a World, filter: Option<&str>) -> Option<Vec<&'a Paper>> {
    let states = states_for(filter)?;
    Some(
        world
            .wallpapers
            .values()
            .filter(|p| states.contains(&p.review_state))
            .collect(),
    )
}

#[get("/wallpapers")]
async fn wallpapers(app: Data, params: web::Query<Params>) -> HttpResponse {
    let world = app.enter();
    match listed(&world, params.safe_filter.as_deref()) {
        Some(papers) => {
            let items = papers.into_iter().map(|p| world.paper_json(p)).collect();
            paged(items, params.page)
        }
        None => respond(StatusCode::UNPROCESSABLE_ENTITY, "unknown safe_filter"),
    }
}

#[get("/wallpapers/random")]
async fn random(app: Data, params: web::Query<Params>) -> HttpResponse {
    let world = app.enter();
    match listed(&world, params.safe_filter.as_deref()) {
        Some(papers) if !papers.is_empty() => {
            let paper = papers[app.hits() % papers.len()];
            one(world.paper_json(paper))
        }
        Some(_) => respond(StatusCode::NOT_FOUND, "no wallpapers"),
        None => respond(StatusCode::UNPROCESSABLE_ENTITY, "unknown safe_filter"),
    }
}

#[post("/wallpapers/{id}/{flag}")]
async fn flag(app: Data, path: web::Path<(u64, String)>, params: web::Query<Params>) -> HttpResponse {
    let (id, mark) = path.into_inner();
    let mut world = app.enter();
    let me = match authed(&world, &params) {
        Ok(me) => me,
        Err(resp) => return resp,
    };
    if !["flag_safe", "flag_not_safe", "flag_deletion"].contains(&mark.as_str()) {
        return respond(StatusCode::NOT_FOUND, "unknown flag");
    }
    let Some(paper) = world.wallpapers.get_mut(&id) else {
        return respond(StatusCode::NOT_FOUND, "wallpaper not found");
    };
    info!("{me} flags {id} with {mark}");
    paper.flags.push(mark);
    let body = world.paper_json(&world.wallpapers[&id]);
    one(body)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/1")
            .service(whoami)
            .service(user)
            .service(collection)
            .service(user_random)
            .service(followers)
            .service(following)
            .service(likes)
            .service(follow)
            .service(unfollow)
            .service(like)
            .service(unlike)
            .service(sync)
            .service(unsync)
            .service(wallpapers)
            .service(random)
            .service(flag),
    );
}

pub async fn run(listener: TcpListener, data: Data) -> io::Result<()> {
    HttpServer::new(move || App::new().app_data(data.clone()).configure(configure))
        .workers(1)
        .listen(listener)?
        .run()
        .await
}

/// A server running on its own thread for the rest of the process.
#[derive(Debug, Clone)]
pub struct MockServer {
    pub addr: SocketAddr,
    pub data: Data,
}

impl MockServer {
    pub fn start() -> io::Result<Self> {
        Self::start_with(World::seed())
    }

    pub fn start_with(world: World) -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        let data = web::Data::new(Mock::new(world));
        let served = data.clone();
        thread::spawn(move || {
            if let Err(e) = actix_web::rt::System::new().block_on(run(listener, served)) {
                log::error!("mock server stopped: {e}");
            }
        });
        Ok(Self { addr, data })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/1", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.data.hits()
    }
}
