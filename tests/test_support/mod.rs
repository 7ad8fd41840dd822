#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, Response, StatusCode},
    Router,
};
use chamada::{
    models::{
        attendance::{Attendance, NewAttendance},
        classroom::{Classroom, NewClassroom},
        student::{NewStudent, Student},
        user::{Credential, NewCredential, NewUser, User},
    },
    state::AppState,
    store::{memory::MemoryRecordStore, Entities, SharedStore},
    web::routes::create_app,
};
use std::{collections::BTreeMap, sync::Arc};
use tower::ServiceExt;
use tower_cookies::Key;
use tower_sessions::MemoryStore;

pub const TEACHER_EMAIL: &str = "prof@escola.pt";
pub const TEACHER_PASSWORD: &str = "segredo123";

/// Aplicação completa (sessões e cookies incluídos) sobre o store em memória.
pub struct TestApp {
    pub router: Router,
    pub memory: Arc<MemoryRecordStore>,
    pub store: SharedStore,
    cookies: BTreeMap<String, String>,
}

impl TestApp {
    pub fn new() -> Self {
        let memory = Arc::new(MemoryRecordStore::new());
        let store: SharedStore = memory.clone();
        let state = AppState::new(store.clone(), Key::generate());
        let router = create_app(state, MemoryStore::default(), false);
        Self {
            router,
            memory,
            store,
            cookies: BTreeMap::new(),
        }
    }

    /// Cria o professor (com hash de custo baixo para os testes serem rápidos) e faz login.
    pub async fn logged_in() -> (Self, User) {
        let mut app = Self::new();
        let user = app.seed_teacher(TEACHER_EMAIL, "Ana Lima").await;
        let res = app
            .post_form(
                "/login",
                &format!("email={}&password={}", TEACHER_EMAIL, TEACHER_PASSWORD),
            )
            .await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER, "login should redirect");
        (app, user)
    }

    pub async fn seed_teacher(&self, email: &str, full_name: &str) -> User {
        let password_hash = bcrypt::hash(TEACHER_PASSWORD, 4).expect("hash");
        Entities::<Credential>::new(self.store.clone())
            .create(&NewCredential {
                email: email.to_string(),
                password_hash,
            })
            .await
            .expect("credential");
        Entities::<User>::new(self.store.clone())
            .create(&NewUser {
                email: email.to_string(),
                full_name: full_name.to_string(),
            })
            .await
            .expect("user")
    }

    pub async fn seed_classroom(&self, teacher: &str, name: &str, subject: &str) -> Classroom {
        Entities::<Classroom>::new(self.store.clone())
            .create(&NewClassroom {
                name: name.to_string(),
                subject: subject.to_string(),
                description: None,
                teacher_email: teacher.to_string(),
            })
            .await
            .expect("classroom")
    }

    pub async fn seed_student(&self, classroom: &Classroom, name: &str, roll: &str, email: Option<&str>) -> Student {
        Entities::<Student>::new(self.store.clone())
            .create(&NewStudent {
                classroom_id: classroom.id.clone(),
                name: name.to_string(),
                roll: roll.to_string(),
                email: email.map(str::to_string),
            })
            .await
            .expect("student")
    }

    pub async fn seed_attendance(
        &self,
        classroom: &Classroom,
        date: &str,
        time: &str,
        student: (&str, &str, Option<&str>),
        status: &str,
    ) -> Attendance {
        Entities::<Attendance>::new(self.store.clone())
            .create(&NewAttendance {
                classroom_id: classroom.id.clone(),
                date: date.to_string(),
                time: time.to_string(),
                teacher_email: classroom.teacher_email.clone(),
                student_name: student.0.to_string(),
                student_roll: student.1.to_string(),
                student_email: student.2.map(str::to_string),
                status: status.to_string(),
            })
            .await
            .expect("attendance")
    }

    pub async fn get(&mut self, uri: &str) -> Response<Body> {
        let req = self.request("GET", uri).body(Body::empty()).expect("request");
        self.send(req).await
    }

    pub async fn post_form(&mut self, uri: &str, body: &str) -> Response<Body> {
        let req = self
            .request("POST", uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .expect("request");
        self.send(req).await
    }

    /// Envia um único ficheiro como `multipart/form-data`.
    pub async fn post_multipart(&mut self, uri: &str, field: &str, filename: &str, content: &str) -> Response<Body> {
        let boundary = "chamada-test-boundary";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
             Content-Type: text/csv\r\n\r\n{content}\r\n--{b}--\r\n",
            b = boundary,
        );
        let req = self
            .request("POST", uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .expect("request");
        self.send(req).await
    }

    fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let mut builder = Request::builder().method(method).uri(uri);
        if !self.cookies.is_empty() {
            let jar = self
                .cookies
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(header::COOKIE, jar);
        }
        builder
    }

    // Guarda os Set-Cookie como um browser faria (valor vazio = cookie removido)
    async fn send(&mut self, req: Request<Body>) -> Response<Body> {
        let res = self.router.clone().oneshot(req).await.expect("response");
        for value in res.headers().get_all(header::SET_COOKIE) {
            let raw = value.to_str().expect("ascii cookie");
            let pair = raw.split(';').next().unwrap_or_default();
            if let Some((name, value)) = pair.split_once('=') {
                let removed = value.is_empty() || raw.contains("Max-Age=0");
                if removed {
                    self.cookies.remove(name.trim());
                } else {
                    self.cookies.insert(name.trim().to_string(), value.to_string());
                }
            }
        }
        res
    }
}

pub fn location(res: &Response<Body>) -> String {
    res.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub async fn body_text(res: Response<Body>) -> String {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}
