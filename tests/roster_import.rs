mod test_support;

use axum::http::StatusCode;
use chamada::store::{memory::StoreOp, EntityKind};
use test_support::{body_text, location, TestApp, TEACHER_EMAIL};

#[tokio::test]
async fn csv_upload_adds_every_row_to_the_roster() {
    let (mut app, _) = TestApp::logged_in().await;
    let classroom = app.seed_classroom(TEACHER_EMAIL, "Math A", "Math").await;
    let roster = format!("/classrooms/{}/students", classroom.id);

    let csv = "name,roll,email\nAsha,7,asha@x.com\nBruno,10,\nCarla,8,carla@x.com\n";
    let res = app
        .post_multipart(&format!("{}/import", roster), "file", "turma.csv", csv)
        .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), roster);
    assert_eq!(app.memory.len(EntityKind::Student).await, 3);

    let body = body_text(app.get(&roster).await).await;
    assert!(body.contains("Imported 3 students."));
    assert!(body.contains("Roster (3)"));
    // ordenado por roll: 7, 8, 10
    let asha = body.find("Asha").unwrap();
    let carla = body.find("Carla").unwrap();
    let bruno = body.find("Bruno").unwrap();
    assert!(asha < carla && carla < bruno);
    assert!(body.contains("carla@x.com"));
}

#[tokio::test]
async fn csv_with_an_invalid_row_adds_nobody() {
    let (mut app, _) = TestApp::logged_in().await;
    let classroom = app.seed_classroom(TEACHER_EMAIL, "Math A", "Math").await;
    let roster = format!("/classrooms/{}/students", classroom.id);
    app.memory.reset_calls().await;

    let csv = "name,roll\nAsha,7\n,8\n";
    let res = app
        .post_multipart(&format!("{}/import", roster), "file", "turma.csv", csv)
        .await;
    assert_eq!(location(&res), roster);
    assert_eq!(app.memory.count_calls(StoreOp::Create, EntityKind::Student).await, 0);

    let body = body_text(app.get(&roster).await).await;
    assert!(body.contains("Import refused"));
    assert!(body.contains("Row 3:"));
    assert!(body.contains("No students in this classroom yet."));
}

#[tokio::test]
async fn upload_without_a_file_field_is_reported() {
    let (mut app, _) = TestApp::logged_in().await;
    let classroom = app.seed_classroom(TEACHER_EMAIL, "Math A", "Math").await;
    let roster = format!("/classrooms/{}/students", classroom.id);

    app.post_multipart(&format!("{}/import", roster), "other", "turma.csv", "name,roll\nAsha,7\n")
        .await;
    let body = body_text(app.get(&roster).await).await;
    assert!(body.contains("Choose a CSV file to import."));
    assert_eq!(app.memory.len(EntityKind::Student).await, 0);
}

#[tokio::test]
async fn import_into_a_foreign_classroom_is_refused() {
    let (mut app, _) = TestApp::logged_in().await;
    app.seed_teacher("outro@escola.pt", "Rui").await;
    let foreign = app.seed_classroom("outro@escola.pt", "Chem", "Chemistry").await;

    let res = app
        .post_multipart(
            &format!("/classrooms/{}/students/import", foreign.id),
            "file",
            "turma.csv",
            "name,roll\nAsha,7\n",
        )
        .await;
    assert!(res.status().is_client_error());
    assert_eq!(app.memory.len(EntityKind::Student).await, 0);
}
