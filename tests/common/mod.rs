// In-process stand-in for the HSS file store, served with tiny_http.
// It keeps directories and files in memory (optionally mirrored to a
// backing directory on disk) and records every request it sees as
// "<METHOD> <canonical path> <query>".
#![allow(dead_code)]

use hss_cli::smoke::md5_hex;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tiny_http::{Header, Method, Request, Response, Server};

#[derive(Default)]
struct State {
    dirs: BTreeSet<String>,
    files: BTreeMap<String, Vec<u8>>,
    listing_overrides: HashMap<String, String>,
    log: Vec<String>,
    backing: Option<PathBuf>,
}

pub struct FakeStore {
    pub base_url: String,
    server: Arc<Server>,
    state: Arc<Mutex<State>>,
    handle: Option<JoinHandle<()>>,
}

/// Resolve a request path the way the server does: empty and `.` segments
/// vanish, `..` pops. The root is the empty string.
pub fn canonical(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

fn parent(key: &str) -> &str {
    key.rsplit_once('/').map(|(p, _)| p).unwrap_or("")
}

impl FakeStore {
    pub fn start() -> FakeStore {
        let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
        let port = server.server_addr().to_ip().unwrap().port();
        let state = Arc::new(Mutex::new(State::default()));
        state.lock().unwrap().dirs.insert(String::new());

        let handle = thread::spawn({
            let server = server.clone();
            let state = state.clone();
            move || {
                while let Ok(request) = server.recv() {
                    serve(&state, request);
                }
            }
        });

        FakeStore {
            base_url: format!("http://127.0.0.1:{port}"),
            server,
            state,
            handle: Some(handle),
        }
    }

    /// Mirror directories and files under `root`, like the real server's
    /// data store.
    pub fn with_backing(self, root: &Path) -> FakeStore {
        self.state.lock().unwrap().backing = Some(root.to_path_buf());
        self
    }

    pub fn mkdir(&self, path: &str) {
        self.state.lock().unwrap().dirs.insert(canonical(path));
    }

    pub fn put_file(&self, path: &str, data: &[u8]) {
        self.state
            .lock()
            .unwrap()
            .files
            .insert(canonical(path), data.to_vec());
    }

    /// Answer listings of `path` with `body` verbatim.
    pub fn override_listing(&self, path: &str, body: &str) {
        self.state
            .lock()
            .unwrap()
            .listing_overrides
            .insert(canonical(path), body.to_string());
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.state.lock().unwrap().dirs.contains(&canonical(path))
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.state.lock().unwrap().files.get(&canonical(path)).cloned()
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().log.clone()
    }

    pub fn requests_with(&self, method: &str) -> Vec<String> {
        let prefix = format!("{method} ");
        self.requests()
            .into_iter()
            .filter(|r| r.starts_with(&prefix))
            .collect()
    }
}

impl Drop for FakeStore {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn serve(state: &Mutex<State>, mut request: Request) {
    let url = request.url().to_string();
    let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));
    let key = canonical(path);
    let params: HashMap<&str, &str> = query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .collect();
    let kind = params.get("type").copied().unwrap_or("");
    let listing = params.get("operation") == Some(&"list");

    let mut body = Vec::new();
    let _ = request.as_reader().read_to_end(&mut body);

    let method = request.method().clone();
    let (status, headers, payload) = {
        let mut state = state.lock().unwrap();
        state.log.push(format!("{method} {key} {query}"));
        route(&mut state, &method, kind, listing, &key, body)
    };

    let mut response = Response::from_data(payload).with_status_code(status);
    for (name, value) in headers {
        response.add_header(Header::from_bytes(name.as_bytes(), value.as_bytes()).unwrap());
    }
    let _ = request.respond(response);
}

type Reply = (u16, Vec<(String, String)>, Vec<u8>);

fn reply(status: u16) -> Reply {
    (status, Vec::new(), Vec::new())
}

fn route(
    state: &mut State,
    method: &Method,
    kind: &str,
    listing: bool,
    key: &str,
    body: Vec<u8>,
) -> Reply {
    match (method, kind) {
        (Method::Get, "directory") if listing => list(state, key),
        (Method::Head, "directory") => reply(if state.dirs.contains(key) { 200 } else { 404 }),
        (Method::Post, "directory") => {
            if key.is_empty() || !state.dirs.contains(parent(key)) {
                return reply(404);
            }
            state.dirs.insert(key.to_string());
            if let Some(root) = &state.backing {
                fs::create_dir_all(root.join(key)).unwrap();
            }
            reply(201)
        }
        (Method::Delete, "directory") => {
            if key.is_empty() || !state.dirs.contains(key) {
                return reply(404);
            }
            let nested = format!("{key}/");
            state.dirs.retain(|d| d != key && !d.starts_with(&nested));
            state.files.retain(|f, _| !f.starts_with(&nested));
            if let Some(root) = &state.backing {
                let _ = fs::remove_dir_all(root.join(key));
            }
            reply(200)
        }
        (Method::Post, "file") => {
            if !state.dirs.contains(parent(key)) {
                return reply(404);
            }
            if let Some(root) = &state.backing {
                fs::write(root.join(key), &body).unwrap();
            }
            state.files.insert(key.to_string(), body);
            reply(200)
        }
        (Method::Get, "file") => match state.files.get(key) {
            Some(data) => (200, Vec::new(), data.clone()),
            None => reply(404),
        },
        (Method::Head, "file") => match state.files.get(key) {
            Some(data) => (
                200,
                vec![
                    ("File-Name".to_string(), key.rsplit('/').next().unwrap_or("").to_string()),
                    ("File-Size".to_string(), data.len().to_string()),
                    ("File-MD5".to_string(), md5_hex(data)),
                ],
                Vec::new(),
            ),
            None => reply(404),
        },
        (Method::Delete, "file") => {
            if state.files.remove(key).is_none() {
                return reply(404);
            }
            if let Some(root) = &state.backing {
                let _ = fs::remove_file(root.join(key));
            }
            reply(200)
        }
        _ => reply(400),
    }
}

fn list(state: &State, key: &str) -> Reply {
    if let Some(body) = state.listing_overrides.get(key) {
        return (200, Vec::new(), body.clone().into_bytes());
    }
    if !state.dirs.contains(key) {
        return reply(404);
    }
    let child_of = |path: &&String| !path.is_empty() && parent(path) == key;
    let mut entries: Vec<serde_json::Value> = state
        .dirs
        .iter()
        .filter(child_of)
        .map(|d| json!({"name": d.rsplit('/').next(), "type": "directory", "key": d}))
        .collect();
    entries.extend(
        state
            .files
            .keys()
            .filter(child_of)
            .map(|f| json!({"name": f.rsplit('/').next(), "type": "file", "key": f})),
    );
    let body = if entries.is_empty() {
        "null".to_string()
    } else {
        serde_json::to_string(&entries).unwrap()
    };
    (
        200,
        vec![("Content-Type".to_string(), "application/json".to_string())],
        body.into_bytes(),
    )
}
