// Scripted stand-ins for the two remote services.
#![allow(dead_code)]

use async_trait::async_trait;
use poem_pipeline::traits::{FeedViewPost, PostRecord, PostView};
use poem_pipeline::{
    CompletionBackend, FeedApi, FeedCredentials, FeedPage, PipelineError, Result, Session,
};
use std::collections::VecDeque;
use std::sync::Mutex;

pub fn credentials() -> FeedCredentials {
    FeedCredentials {
        identifier: "poet.bsky.social".to_string(),
        password: "app-password".to_string(),
    }
}

pub fn item(text: &str, created_at: &str) -> FeedViewPost {
    FeedViewPost {
        post: PostView {
            uri: format!("at://did:plc:poet/app.bsky.feed.post/{}", created_at),
            cid: format!("cid-{}", created_at),
            record: PostRecord {
                text: text.to_string(),
                created_at: created_at.to_string(),
                tags: Vec::new(),
            },
        },
    }
}

pub fn page(items: Vec<FeedViewPost>, cursor: Option<&str>) -> FeedPage {
    FeedPage {
        feed: items,
        cursor: cursor.map(str::to_string),
    }
}

/// Serves pages in order, then empty pages. Records every requested
/// `(limit, cursor)`.
pub struct ScriptedFeed {
    auth_fails: bool,
    pages: Mutex<VecDeque<Result<FeedPage>>>,
    pub requests: Mutex<Vec<(u32, Option<String>)>>,
}

impl ScriptedFeed {
    pub fn new(pages: Vec<Result<FeedPage>>) -> Self {
        Self {
            auth_fails: false,
            pages: Mutex::new(pages.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting_login() -> Self {
        Self {
            auth_fails: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn requests(&self) -> Vec<(u32, Option<String>)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedApi for ScriptedFeed {
    async fn create_session(&self, _credentials: &FeedCredentials) -> Result<Session> {
        if self.auth_fails {
            return Err(PipelineError::Auth("invalid identifier or password".to_string()));
        }
        Ok(Session {
            access_jwt: "jwt".to_string(),
            did: "did:plc:poet".to_string(),
        })
    }

    async fn author_feed(
        &self,
        _session: &Session,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<FeedPage> {
        self.requests
            .lock()
            .unwrap()
            .push((limit, cursor.map(str::to_string)));
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(FeedPage::default()))
    }
}

type Responder = Box<dyn Fn(&str, &str) -> Result<String> + Send + Sync>;

enum Script {
    Queue(Mutex<VecDeque<Result<String>>>),
    Respond(Responder),
}

/// Completion backend that answers from a queue or a closure and records
/// every `(system, user)` prompt pair.
pub struct ScriptedCompletion {
    script: Script,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedCompletion {
    /// Answers in order; an exhausted queue fails like a dead service.
    pub fn queue(answers: Vec<Result<String>>) -> Self {
        Self {
            script: Script::Queue(Mutex::new(answers.into())),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(f: impl Fn(&str, &str) -> Result<String> + Send + Sync + 'static) -> Self {
        Self {
            script: Script::Respond(Box::new(f)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self::respond(|_, _| Err(service_down()))
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

pub fn service_down() -> PipelineError {
    PipelineError::Api {
        status: 503,
        message: "service unavailable".to_string(),
    }
}

pub fn ok(text: &str) -> Result<String> {
    Ok(text.to_string())
}

#[async_trait]
impl CompletionBackend for ScriptedCompletion {
    fn backend_name(&self) -> String {
        "scripted".to_string()
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), user_prompt.to_string()));
        match &self.script {
            Script::Queue(answers) => answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(service_down())),
            Script::Respond(f) => f(system_prompt, user_prompt),
        }
    }
}

/// Routes by prompt so each enrichment step gets a distinct answer.
pub fn poet_model() -> ScriptedCompletion {
    ScriptedCompletion::respond(|system, user| {
        let answer = if system.contains("corrects capitalization") {
            "The moon is bright tonight."
        } else if system.contains("title generator") {
            "\"Moon's Glow!\""
        } else if system.contains("translator of English text") {
            "'luce della luna'"
        } else if system.contains("translator of English poetry") {
            "La luna è luminosa stanotte."
        } else if system.contains("poetry analysis") {
            "Tender, LOVING, robots, haiku, sad, dark"
        } else {
            return Err(PipelineError::General(format!("unexpected prompt: {}", user)));
        };
        ok(answer)
    })
}
