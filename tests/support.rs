//! Common test support utilities and fixtures
//!
//! [`FakeGitHub`] is an in-memory stand-in for the handful of GitHub REST
//! endpoints prflow talks to. It keeps branches, files and pull requests per
//! repository and answers with the same status codes and error bodies the real
//! API uses, so the client's error classification is exercised end to end.

#![allow(dead_code)]

use async_trait::async_trait;
use prflow::commands::CommandContext;
use prflow::config::Config;
use prflow::github::transport::{ApiRequest, ApiResponse, Transport};
use prflow::github::{ApiError, Credentials, GitHubClient, Method, decode_content, encode_content};
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::process::Command;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::Notify;
use url::Url;

pub const API_BASE: &str = "https://api.github.test";
pub const ACCOUNT: &str = "octo";
pub const TOKEN: &str = "ghp_test_token";

/// Head of `main` in repositories created by [`FakeGitHub::add_repo`]
pub const MAIN_SHA: &str = "abc123";

struct StoredFile {
    content: Vec<u8>,
    sha: String,
}

struct StoredPull {
    number: u64,
    head: String,
    base: String,
    open: bool,
}

struct FakeRepo {
    owner: String,
    name: String,
    default_branch: String,
    private: bool,
    branches: BTreeMap<String, String>,
    files: HashMap<(String, String), StoredFile>,
    pulls: Vec<StoredPull>,
}

impl FakeRepo {
    fn summary(&self) -> Value {
        json!({
            "id": self.name.len(),
            "name": self.name,
            "full_name": format!("{}/{}", self.owner, self.name),
            "private": self.private,
            "owner": { "login": self.owner },
            "default_branch": self.default_branch,
            "html_url": format!("https://github.com/{}/{}", self.owner, self.name),
        })
    }
}

#[derive(Default)]
struct FakeState {
    repos: Vec<FakeRepo>,
    counter: u64,
    next_pull: u64,
    requests: Vec<String>,
}

/// In-memory GitHub used as the client's transport
pub struct FakeGitHub {
    state: Mutex<FakeState>,
    stall: Mutex<Option<(Method, String)>>,
    stalled: Arc<Notify>,
}

impl FakeGitHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeState::default()),
            stall: Mutex::new(None),
            stalled: Arc::new(Notify::new()),
        })
    }

    /// Client authenticated as [`ACCOUNT`] talking to this fake
    pub fn client(self: &Arc<Self>) -> GitHubClient {
        let transport: Arc<dyn Transport> = self.clone();
        GitHubClient::with_transport(Credentials::new(TOKEN, ACCOUNT), API_BASE, transport)
            .expect("valid API base")
    }

    /// Client that sends a token the fake does not accept
    pub fn client_with_token(self: &Arc<Self>, token: &str) -> GitHubClient {
        let transport: Arc<dyn Transport> = self.clone();
        GitHubClient::with_transport(Credentials::new(token, ACCOUNT), API_BASE, transport)
            .expect("valid API base")
    }

    /// Add a repository whose `main` branch points at [`MAIN_SHA`]
    pub fn add_repo(&self, owner: &str, name: &str) {
        self.insert_repo(owner, name, false);
        self.add_branch(owner, name, "main", MAIN_SHA);
    }

    pub fn add_private_repo(&self, owner: &str, name: &str) {
        self.insert_repo(owner, name, true);
        self.add_branch(owner, name, "main", MAIN_SHA);
    }

    /// Add a repository without any commits
    pub fn add_empty_repo(&self, owner: &str, name: &str) {
        self.insert_repo(owner, name, false);
    }

    fn insert_repo(&self, owner: &str, name: &str, private: bool) {
        self.state.lock().unwrap().repos.push(FakeRepo {
            owner: owner.to_string(),
            name: name.to_string(),
            default_branch: "main".to_string(),
            private,
            branches: BTreeMap::new(),
            files: HashMap::new(),
            pulls: Vec::new(),
        });
    }

    pub fn add_branch(&self, owner: &str, name: &str, branch: &str, sha: &str) {
        let mut state = self.state.lock().unwrap();
        let repo = state.repo_mut(owner, name).expect("repository exists");
        repo.branches.insert(branch.to_string(), sha.to_string());
    }

    pub fn add_file(&self, owner: &str, name: &str, branch: &str, path: &str, content: &[u8]) {
        let mut state = self.state.lock().unwrap();
        let sha = state.next_sha();
        let repo = state.repo_mut(owner, name).expect("repository exists");
        repo.files.insert(
            (branch.to_string(), path.to_string()),
            StoredFile {
                content: content.to_vec(),
                sha,
            },
        );
    }

    pub fn branch_sha(&self, owner: &str, name: &str, branch: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state.repo(owner, name)?.branches.get(branch).cloned()
    }

    pub fn file_content(&self, owner: &str, name: &str, branch: &str, path: &str) -> Option<Vec<u8>> {
        let state = self.state.lock().unwrap();
        state
            .repo(owner, name)?
            .files
            .get(&(branch.to_string(), path.to_string()))
            .map(|file| file.content.clone())
    }

    /// `(number, head, base)` of every open pull request
    pub fn open_pulls(&self, owner: &str, name: &str) -> Vec<(u64, String, String)> {
        let state = self.state.lock().unwrap();
        state
            .repo(owner, name)
            .map(|repo| {
                repo.pulls
                    .iter()
                    .filter(|pull| pull.open)
                    .map(|pull| (pull.number, pull.head.clone(), pull.base.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every request seen so far as `METHOD /path`
    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Never answer requests for `method path`; [`FakeGitHub::stalled`] fires when one arrives
    pub fn stall_on(&self, method: Method, path: &str) {
        *self.stall.lock().unwrap() = Some((method, path.to_string()));
    }

    pub fn stalled(&self) -> Arc<Notify> {
        self.stalled.clone()
    }
}

#[async_trait]
impl Transport for FakeGitHub {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = Url::parse(&request.url).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        let path = url.path().to_string();
        self.state
            .lock()
            .unwrap()
            .requests
            .push(format!("{} {}", request.method, path));

        let stall = self.stall.lock().unwrap().clone();
        if let Some((method, stall_path)) = stall
            && method == request.method
            && stall_path == path
        {
            self.stalled.notify_one();
            std::future::pending::<()>().await;
        }

        let expected_auth = format!("Bearer {}", TOKEN);
        if request.header("Authorization") != Some(expected_auth.as_str()) {
            return Ok(respond(401, json!({ "message": "Bad credentials" })));
        }

        let segments: Vec<String> = url
            .path_segments()
            .map(|parts| parts.map(decode_segment).collect())
            .unwrap_or_default();
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
        let body: Value = request
            .body
            .as_ref()
            .and_then(|body| serde_json::from_slice(&body.bytes).ok())
            .unwrap_or(Value::Null);

        let mut state = self.state.lock().unwrap();
        Ok(state.route(&request.method, &segments, &query, &body))
    }
}

fn decode_segment(segment: &str) -> String {
    url::form_urlencoded::parse(format!("s={}", segment).as_bytes())
        .next()
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}

fn respond(status: u16, body: Value) -> ApiResponse {
    ApiResponse::new(status, body.to_string())
}

fn not_found() -> ApiResponse {
    respond(
        404,
        json!({
            "message": "Not Found",
            "documentation_url": "https://docs.github.com/rest",
        }),
    )
}

fn validation_failed(errors: Value) -> ApiResponse {
    respond(
        422,
        json!({ "message": "Validation Failed", "errors": errors }),
    )
}

impl FakeState {
    fn repo(&self, owner: &str, name: &str) -> Option<&FakeRepo> {
        self.repos
            .iter()
            .find(|repo| repo.owner == owner && repo.name == name)
    }

    fn repo_mut(&mut self, owner: &str, name: &str) -> Option<&mut FakeRepo> {
        self.repos
            .iter_mut()
            .find(|repo| repo.owner == owner && repo.name == name)
    }

    fn next_sha(&mut self) -> String {
        self.counter += 1;
        format!("{:040x}", self.counter)
    }

    fn route(
        &mut self,
        method: &Method,
        segments: &[&str],
        query: &HashMap<String, String>,
        body: &Value,
    ) -> ApiResponse {
        match (method.as_str(), segments) {
            ("GET", ["user", "repos"]) => {
                let list: Vec<Value> = self.repos.iter().map(FakeRepo::summary).collect();
                respond(200, Value::Array(list))
            }
            ("GET", ["repos", owner, name, "git", "ref", "heads", branch @ ..]) => {
                self.get_ref(owner, name, &branch.join("/"))
            }
            ("POST", ["repos", owner, name, "git", "refs"]) => self.create_ref(owner, name, body),
            ("GET", ["repos", owner, name, "contents", path @ ..]) => {
                self.get_content(owner, name, &path.join("/"), query.get("ref"))
            }
            ("PUT", ["repos", owner, name, "contents", path @ ..]) => {
                self.put_content(owner, name, &path.join("/"), body)
            }
            ("POST", ["repos", owner, name, "pulls"]) => self.create_pull(owner, name, body),
            ("GET", ["repos", owner, name, "pulls"]) => self.list_pulls(owner, name, query),
            _ => not_found(),
        }
    }

    fn get_ref(&self, owner: &str, name: &str, branch: &str) -> ApiResponse {
        let Some(repo) = self.repo(owner, name) else {
            return not_found();
        };
        if repo.branches.is_empty() {
            return respond(409, json!({ "message": "Git Repository is empty." }));
        }
        match repo.branches.get(branch) {
            Some(sha) => respond(
                200,
                json!({
                    "ref": format!("refs/heads/{}", branch),
                    "object": { "sha": sha, "type": "commit" },
                }),
            ),
            None => not_found(),
        }
    }

    fn create_ref(&mut self, owner: &str, name: &str, body: &Value) -> ApiResponse {
        let Some(repo) = self.repo_mut(owner, name) else {
            return not_found();
        };
        let (Some(full_ref), Some(sha)) = (body["ref"].as_str(), body["sha"].as_str()) else {
            return respond(422, json!({ "message": "Invalid request." }));
        };
        let Some(branch) = full_ref.strip_prefix("refs/heads/") else {
            return respond(
                422,
                json!({ "message": "Reference name must start with 'refs/'." }),
            );
        };
        if repo.branches.contains_key(branch) {
            return respond(422, json!({ "message": "Reference already exists" }));
        }

        repo.branches.insert(branch.to_string(), sha.to_string());
        respond(
            201,
            json!({ "ref": full_ref, "object": { "sha": sha, "type": "commit" } }),
        )
    }

    fn get_content(
        &self,
        owner: &str,
        name: &str,
        path: &str,
        reference: Option<&String>,
    ) -> ApiResponse {
        let Some(repo) = self.repo(owner, name) else {
            return not_found();
        };
        let branch = reference
            .cloned()
            .unwrap_or_else(|| repo.default_branch.clone());
        if !repo.branches.contains_key(&branch) {
            return respond(
                404,
                json!({ "message": format!("No commit found for the ref {}", branch) }),
            );
        }
        match repo.files.get(&(branch, path.to_string())) {
            Some(file) => respond(
                200,
                json!({
                    "type": "file",
                    "name": path.rsplit('/').next().unwrap_or(path),
                    "path": path,
                    "sha": file.sha,
                    "encoding": "base64",
                    "content": format!("{}\n", encode_content(&file.content)),
                }),
            ),
            None => not_found(),
        }
    }

    fn put_content(&mut self, owner: &str, name: &str, path: &str, body: &Value) -> ApiResponse {
        let blob_sha = self.next_sha();
        let commit_sha = self.next_sha();
        let Some(repo) = self.repo_mut(owner, name) else {
            return not_found();
        };

        let branch = body["branch"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| repo.default_branch.clone());
        if !repo.branches.contains_key(&branch) {
            return respond(
                404,
                json!({ "message": format!("Branch {} not found", branch) }),
            );
        }

        let Some(content) = body["content"]
            .as_str()
            .and_then(|encoded| decode_content(encoded).ok())
        else {
            return respond(422, json!({ "message": "content is not valid Base64" }));
        };

        let key = (branch.clone(), path.to_string());
        if let Some(existing) = repo.files.get(&key) {
            match body["sha"].as_str() {
                None => {
                    return respond(
                        422,
                        json!({ "message": "Invalid request.\n\n\"sha\" wasn't supplied." }),
                    );
                }
                Some(sha) if sha != existing.sha => {
                    return respond(
                        409,
                        json!({ "message": format!("{} does not match {}", path, sha) }),
                    );
                }
                Some(_) => {}
            }
        }

        let created = !repo.files.contains_key(&key);
        repo.files.insert(
            key,
            StoredFile {
                content,
                sha: blob_sha.clone(),
            },
        );
        repo.branches.insert(branch, commit_sha.clone());

        respond(
            if created { 201 } else { 200 },
            json!({
                "content": { "path": path, "sha": blob_sha },
                "commit": { "sha": commit_sha, "message": body["message"] },
            }),
        )
    }

    fn create_pull(&mut self, owner: &str, name: &str, body: &Value) -> ApiResponse {
        let number = self.next_pull + 1;
        let Some(repo) = self.repo_mut(owner, name) else {
            return not_found();
        };

        let head = body["head"].as_str().unwrap_or_default();
        let head = head.split_once(':').map_or(head, |(_, branch)| branch);
        let base = body["base"].as_str().unwrap_or_default();

        for (field, branch) in [("base", base), ("head", head)] {
            if !repo.branches.contains_key(branch) {
                return validation_failed(json!([
                    { "resource": "PullRequest", "field": field, "code": "invalid" }
                ]));
            }
        }

        if repo
            .pulls
            .iter()
            .any(|pull| pull.open && pull.head == head && pull.base == base)
        {
            return validation_failed(json!([{
                "resource": "PullRequest",
                "code": "custom",
                "message": format!("A pull request already exists for {}:{}.", owner, head),
            }]));
        }

        if repo.branches.get(head) == repo.branches.get(base) {
            return validation_failed(json!([{
                "resource": "PullRequest",
                "code": "custom",
                "message": format!("No commits between {} and {}", base, head),
            }]));
        }

        repo.pulls.push(StoredPull {
            number,
            head: head.to_string(),
            base: base.to_string(),
            open: true,
        });
        let response = pull_json(owner, name, number, body["draft"].as_bool().unwrap_or(false));
        self.next_pull = number;
        respond(201, response)
    }

    fn list_pulls(&self, owner: &str, name: &str, query: &HashMap<String, String>) -> ApiResponse {
        let Some(repo) = self.repo(owner, name) else {
            return not_found();
        };
        let head = query
            .get("head")
            .map(|head| head.split_once(':').map_or(head.as_str(), |(_, branch)| branch));
        let base = query.get("base").map(String::as_str);

        let pulls: Vec<Value> = repo
            .pulls
            .iter()
            .filter(|pull| pull.open)
            .filter(|pull| head.is_none_or(|head| pull.head == head))
            .filter(|pull| base.is_none_or(|base| pull.base == base))
            .map(|pull| pull_json(owner, name, pull.number, false))
            .collect();
        respond(200, Value::Array(pulls))
    }
}

fn pull_json(owner: &str, name: &str, number: u64, draft: bool) -> Value {
    json!({
        "number": number,
        "state": "open",
        "draft": draft,
        "html_url": format!("https://github.com/{}/{}/pull/{}", owner, name, number),
    })
}

/// Command context whose client talks to `fake`
pub fn create_test_context(fake: &Arc<FakeGitHub>) -> CommandContext {
    CommandContext::new(Config::new(TOKEN, ACCOUNT), fake.client())
}

/// A test workspace with temporary directory and config management
pub struct Workspace {
    pub root: TempDir,
    pub config_path: PathBuf,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    /// Create a new temporary workspace
    pub fn new() -> Self {
        let root = TempDir::new().expect("Failed to create temp directory");
        let config_path = root.path().join("config.json");
        Self { root, config_path }
    }

    /// Write configuration JSON to the workspace
    pub fn write_config(&self, json: &str) {
        std::fs::write(&self.config_path, json).expect("Failed to write config");
    }

    /// Get the workspace root path
    pub fn path(&self) -> &std::path::Path {
        self.root.path()
    }

    /// Get the config file path as string
    pub fn config_str(&self) -> &str {
        self.config_path.to_str().expect("Config path not UTF-8")
    }
}

/// Result of running a CLI command
#[derive(Debug)]
pub struct CliOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Run the prflow binary with given arguments
pub fn run_cli(args: &[&str], cwd: Option<&std::path::Path>) -> CliOutput {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_prflow"));
    cmd.args(args);
    cmd.env_remove("GITHUB_TOKEN");
    cmd.env_remove("RUST_LOG");

    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let output = cmd.output().expect("Failed to execute prflow");

    CliOutput {
        status: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}
