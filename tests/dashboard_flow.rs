mod test_support;

use axum::http::StatusCode;
use chamada::{
    store::{memory::StoreOp, EntityKind},
    web::dashboard_handlers::DELETE_FAILED,
};
use test_support::{body_text, location, TestApp, TEACHER_EMAIL};

#[tokio::test]
async fn dashboard_counts_students_per_classroom() {
    let (mut app, _) = TestApp::logged_in().await;
    let a = app.seed_classroom(TEACHER_EMAIL, "Math A", "Math").await;
    app.seed_classroom(TEACHER_EMAIL, "Math B", "math").await;
    let c = app.seed_classroom(TEACHER_EMAIL, "Physics", "Physics").await;
    app.seed_classroom("outro@escola.pt", "Alheia", "History").await;
    for roll in ["1", "2", "3"] {
        app.seed_student(&a, "Aluno", roll, None).await;
    }
    for roll in ["1", "2", "3", "4", "5"] {
        app.seed_student(&c, "Aluno", roll, None).await;
    }

    app.memory.reset_calls().await;

    let res = app.get("/").await;
    assert_eq!(res.status(), StatusCode::OK);
    // uma consulta de alunos por turma do professor
    assert_eq!(app.memory.count_calls(StoreOp::Filter, EntityKind::Classroom).await, 1);
    assert_eq!(app.memory.count_calls(StoreOp::Filter, EntityKind::Student).await, 3);
    let body = body_text(res).await;
    assert!(body.contains("Math A"));
    assert!(!body.contains("Alheia"));
    // 3 turmas, 8 alunos, 3 disciplinas ("Math" e "math" são diferentes)
    assert!(body.contains("Total Classrooms</div><strong>3</strong>"), "{}", body);
    assert!(body.contains("Total Students</div><strong>8</strong>"));
    assert!(body.contains("Subjects</div><strong>3</strong>"));
}

#[tokio::test]
async fn dashboard_fetch_failure_collapses_to_login_prompt() {
    let (mut app, _) = TestApp::logged_in().await;
    app.memory.fail_on(StoreOp::Filter, EntityKind::Classroom).await;

    let res = app.get("/").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(body_text(res).await.contains("Login to Continue"));

    app.memory.clear_failures().await;
    assert_eq!(app.get("/").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn create_classroom_then_see_it() {
    let (mut app, _) = TestApp::logged_in().await;

    let res = app
        .post_form("/classrooms", "name=Math+A&subject=Math&description=")
        .await;
    assert_eq!(location(&res), "/");
    assert_eq!(app.memory.len(EntityKind::Classroom).await, 1);

    let body = body_text(app.get("/").await).await;
    assert!(body.contains("Classroom &#39;Math A&#39; created.") || body.contains("Classroom 'Math A' created."));
}

#[tokio::test]
async fn create_classroom_requires_name_and_subject() {
    let (mut app, _) = TestApp::logged_in().await;
    let res = app.post_form("/classrooms", "name=+&subject=Math").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_text(res).await.contains("Classroom name and subject are required."));
    assert_eq!(app.memory.len(EntityKind::Classroom).await, 0);
}

#[tokio::test]
async fn delete_issues_one_call_and_cascades() {
    let (mut app, _) = TestApp::logged_in().await;
    let classroom = app.seed_classroom(TEACHER_EMAIL, "Math A", "Math").await;
    app.seed_student(&classroom, "Asha", "7", None).await;
    app.seed_attendance(&classroom, "2024-03-01", "09:00", ("Asha", "7", None), "present")
        .await;
    app.memory.reset_calls().await;

    let res = app
        .post_form(&format!("/classrooms/{}/delete", classroom.id), "")
        .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");
    assert_eq!(app.memory.count_calls(StoreOp::Delete, EntityKind::Classroom).await, 1);
    assert_eq!(app.memory.count_calls(StoreOp::Delete, EntityKind::Student).await, 0);
    assert_eq!(app.memory.len(EntityKind::Classroom).await, 0);
    assert_eq!(app.memory.len(EntityKind::Student).await, 0);
    assert_eq!(app.memory.len(EntityKind::Attendance).await, 0);

    // o refresh do dashboard volta a listar as turmas uma única vez
    app.memory.reset_calls().await;
    let body = body_text(app.get("/").await).await;
    assert!(body.contains("Classroom deleted."));
    assert_eq!(app.memory.count_calls(StoreOp::Filter, EntityKind::Classroom).await, 1);
    assert_eq!(app.memory.count_calls(StoreOp::Filter, EntityKind::Student).await, 0);
}

#[tokio::test]
async fn failed_delete_alerts_once_and_changes_nothing() {
    let (mut app, _) = TestApp::logged_in().await;
    let classroom = app.seed_classroom(TEACHER_EMAIL, "Math A", "Math").await;
    app.seed_student(&classroom, "Asha", "7", None).await;
    app.memory.fail_on(StoreOp::Delete, EntityKind::Classroom).await;

    let res = app
        .post_form(&format!("/classrooms/{}/delete", classroom.id), "")
        .await;
    assert_eq!(location(&res), "/");
    assert_eq!(app.memory.len(EntityKind::Classroom).await, 1);
    assert_eq!(app.memory.len(EntityKind::Student).await, 1);

    let body = body_text(app.get("/").await).await;
    assert_eq!(body.matches("Failed to delete classroom. Please try again.").count(), 1);
    assert!(body.contains("Math A"));

    // o flash só aparece uma vez
    let body = body_text(app.get("/").await).await;
    assert!(!body.contains("Failed to delete classroom."));
}

#[tokio::test]
async fn flash_survives_a_dashboard_that_failed_to_load() {
    let (mut app, _) = TestApp::logged_in().await;
    let classroom = app.seed_classroom(TEACHER_EMAIL, "Math A", "Math").await;
    app.memory.fail_on(StoreOp::Delete, EntityKind::Classroom).await;
    app.post_form(&format!("/classrooms/{}/delete", classroom.id), "")
        .await;

    app.memory.fail_on(StoreOp::Filter, EntityKind::Classroom).await;
    let res = app.get("/").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(!body_text(res).await.contains(DELETE_FAILED));

    app.memory.clear_failures().await;
    let body = body_text(app.get("/").await).await;
    assert_eq!(body.matches(DELETE_FAILED).count(), 1);
}

#[tokio::test]
async fn foreign_classroom_is_not_found() {
    let (mut app, _) = TestApp::logged_in().await;
    let foreign = app.seed_classroom("outro@escola.pt", "Alheia", "History").await;

    let res = app.get(&format!("/classrooms/{}/students", foreign.id)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app
        .post_form(&format!("/classrooms/{}/delete", foreign.id), "")
        .await;
    assert_eq!(location(&res), "/");
    assert_eq!(app.memory.len(EntityKind::Classroom).await, 1);
}
