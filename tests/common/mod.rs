#![allow(dead_code)]

use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use serde_json::Value;
use std::sync::Mutex;

/// One request as the stub backend saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("request body is not JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

pub type Route = fn(&Recorded) -> HttpResponse;

pub struct Stub {
    pub api_url: String,
    pub origin: String,
    requests: web::Data<Mutex<Vec<Recorded>>>,
}

impl Stub {
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_to(&self, path: &str) -> Recorded {
        self.requests()
            .into_iter()
            .find(|r| r.path == path)
            .unwrap_or_else(|| panic!("no request to {}", path))
    }
}

/// Starts a backend on an ephemeral port that records every request and
/// answers through `route`.
pub async fn start(route: Route) -> Stub {
    let requests = web::Data::new(Mutex::new(Vec::<Recorded>::new()));
    let data = requests.clone();

    let server = HttpServer::new(move || {
        App::new().app_data(data.clone()).default_service(web::to(
            move |req: HttpRequest, body: web::Bytes, log: web::Data<Mutex<Vec<Recorded>>>| async move {
                let recorded = Recorded {
                    method: req.method().to_string(),
                    path: req.path().to_string(),
                    query: req.query_string().to_string(),
                    content_type: req
                        .headers()
                        .get("content-type")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string(),
                    body: body.to_vec(),
                };
                let response = route(&recorded);
                log.lock().unwrap().push(recorded);
                response
            },
        ))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .expect("failed to bind stub backend");

    let addr = server.addrs()[0];
    actix_rt::spawn(server.run());

    Stub {
        api_url: format!("http://{}/api/v1/", addr),
        origin: format!("http://{}", addr),
        requests,
    }
}
