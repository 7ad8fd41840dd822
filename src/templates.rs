// src/templates.rs
use crate::web::flash::Flash;
use askama::Template;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub error: Option<String>,
    pub return_to: String,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterPage {
    pub error: Option<String>,
    pub email: String,
    pub full_name: String,
}

/// Mostrada pelo middleware quando não há utilizador autenticado.
#[derive(Template)]
#[template(path = "login_prompt.html")]
pub struct LoginPromptPage {
    pub login_url: String,
}

// --- Dashboard ---

#[derive(Clone, Debug)]
pub struct ClassroomCard {
    pub id: String,
    pub name: String,
    pub subject: String,
    pub description: String,
    pub student_count: usize,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardPage {
    pub user_name: String,
    pub flash: Option<Flash>,
    pub classrooms: Vec<ClassroomCard>,
    pub total_classrooms: usize,
    pub total_students: usize,
    pub total_subjects: usize,
}

#[derive(Template)]
#[template(path = "classroom_form.html")]
pub struct ClassroomFormPage {
    pub user_name: String,
    pub flash: Option<Flash>,
    pub error: Option<String>,
    pub name: String,
    pub subject: String,
    pub description: String,
}

// --- Alunos ---

#[derive(Clone, Debug)]
pub struct StudentRow {
    pub id: String,
    pub name: String,
    pub roll: String,
    pub email: String,
}

#[derive(Template)]
#[template(path = "students.html")]
pub struct StudentsPage {
    pub user_name: String,
    pub flash: Option<Flash>,
    pub classroom_id: String,
    pub classroom_name: String,
    pub classroom_subject: String,
    pub students: Vec<StudentRow>,
}

// --- Chamada ---

#[derive(Template)]
#[template(path = "session_select.html")]
pub struct SessionSelectPage {
    pub user_name: String,
    pub flash: Option<Flash>,
    pub classroom_id: String,
    pub classroom_name: String,
    pub classroom_subject: String,
    pub date: String,
    pub time: String,
}

#[derive(Template)]
#[template(path = "mark.html")]
pub struct MarkPage {
    pub user_name: String,
    pub flash: Option<Flash>,
    pub classroom_id: String,
    pub classroom_name: String,
    pub date: String,
    pub time: String,
    pub students: Vec<StudentRow>,
    pub status_prefix: &'static str,
}

// --- Histórico ---

#[derive(Clone, Debug)]
pub struct ClassroomOption {
    pub id: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Clone, Debug)]
pub struct RecordRow {
    pub student_name: String,
    pub student_roll: String,
    pub student_email: String,
    pub status_label: String,
    pub is_present: bool,
}

#[derive(Clone, Debug)]
pub struct SessionCard {
    pub classroom_name: String,
    pub classroom_subject: String,
    pub date_label: String,
    pub time: String,
    pub present: usize,
    pub absent: usize,
    pub total: usize,
    pub records: Vec<RecordRow>,
}

#[derive(Template)]
#[template(path = "history.html")]
pub struct HistoryPage {
    pub user_name: String,
    pub flash: Option<Flash>,
    pub options: Vec<ClassroomOption>,
    pub all_selected: bool,
    pub export_url: String,
    pub record_count: usize,
    pub present: usize,
    pub absent: usize,
    pub sessions: Vec<SessionCard>,
}
