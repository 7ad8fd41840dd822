// src/services/student_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        classroom::Classroom,
        student::{NewStudent, Student, StudentForm},
    },
    store::{Criteria, Entities, SharedStore},
};
use serde::Deserialize;
use std::cmp::Ordering;

// Quantos erros de linha aparecem na mensagem de importação recusada
const MAX_REPORTED_ROWS: usize = 5;

/// Ordena por roll: primeiro os numéricos (por valor), depois os restantes como texto.
pub fn compare_rolls(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<u64>().ok(), b.trim().parse::<u64>().ok()) {
        (Some(na), Some(nb)) => na.cmp(&nb).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Alunos da turma ordenados por roll.
pub async fn list_for_classroom(store: &SharedStore, classroom: &Classroom) -> AppResult<Vec<Student>> {
    let mut students = Entities::<Student>::new(store.clone())
        .filter(&Criteria::new().eq("classroom_id", classroom.id.as_str()), None)
        .await?;
    students.sort_by(|a, b| compare_rolls(&a.roll, &b.roll));
    Ok(students)
}

fn draft_from_form(classroom: &Classroom, form: &StudentForm) -> AppResult<NewStudent> {
    let name = form.name.trim();
    let roll = form.roll.trim();
    if name.is_empty() || roll.is_empty() {
        return Err(AppError::Validation("Student name and roll number are required.".into()));
    }
    let email = form
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string);
    Ok(NewStudent {
        classroom_id: classroom.id.clone(),
        name: name.to_string(),
        roll: roll.to_string(),
        email,
    })
}

pub async fn add_student(store: &SharedStore, classroom: &Classroom, form: &StudentForm) -> AppResult<Student> {
    let draft = draft_from_form(classroom, form)?;
    let student = Entities::<Student>::new(store.clone()).create(&draft).await?;
    tracing::info!("✅ Aluno '{}' (roll {}) adicionado à turma {}", student.name, student.roll, classroom.id);
    Ok(student)
}

async fn find_in_classroom(store: &SharedStore, classroom: &Classroom, student_id: &str) -> AppResult<Student> {
    match Entities::<Student>::new(store.clone()).find(student_id).await? {
        Some(student) if student.classroom_id == classroom.id => Ok(student),
        _ => Err(AppError::NotFound(format!("Student {}", student_id))),
    }
}

pub async fn update_student(
    store: &SharedStore,
    classroom: &Classroom,
    student_id: &str,
    form: &StudentForm,
) -> AppResult<Student> {
    let draft = draft_from_form(classroom, form)?;
    find_in_classroom(store, classroom, student_id).await?;
    let student = Entities::<Student>::new(store.clone())
        .update(student_id, &draft)
        .await?;
    tracing::info!("Aluno {} atualizado na turma {}", student.id, classroom.id);
    Ok(student)
}

pub async fn remove_student(store: &SharedStore, classroom: &Classroom, student_id: &str) -> AppResult<()> {
    let student = find_in_classroom(store, classroom, student_id).await?;
    Entities::<Student>::new(store.clone()).delete(&student.id).await?;
    tracing::info!("Aluno {} removido da turma {}", student.id, classroom.id);
    Ok(())
}

// Linha do ficheiro de importação; cabeçalhos já em minúsculas.
#[derive(Debug, Deserialize)]
struct ImportRow {
    #[serde(alias = "student name")]
    name: String,
    #[serde(alias = "roll number", alias = "roll no")]
    roll: String,
    #[serde(default)]
    email: Option<String>,
}

fn has_column(headers: &csv::StringRecord, names: &[&str]) -> bool {
    headers.iter().any(|h| names.contains(&h))
}

/// Lê um CSV de alunos (colunas `name`, `roll` e, opcional, `email`).
///
/// Cada linha é validada como no formulário. Basta uma linha inválida para
/// recusar o ficheiro inteiro; a mensagem indica as primeiras linhas com erro.
pub fn parse_roster_csv(classroom: &Classroom, data: &[u8]) -> AppResult<Vec<NewStudent>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(data);

    let headers: csv::StringRecord = reader
        .headers()
        .map_err(|e| AppError::Validation(format!("Could not read the file header: {}", e)))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_lowercase())
        .collect();
    if !has_column(&headers, &["name", "student name"])
        || !has_column(&headers, &["roll", "roll number", "roll no"])
    {
        return Err(AppError::Validation(
            "The file needs 'name' and 'roll' columns.".into(),
        ));
    }
    reader.set_headers(headers);

    let mut drafts = Vec::new();
    let mut errors = Vec::new();
    for (index, row) in reader.deserialize::<ImportRow>().enumerate() {
        // linha 1 é o cabeçalho
        let line = index + 2;
        let draft = row
            .map_err(|e| AppError::Validation(e.to_string()))
            .and_then(|row| {
                draft_from_form(
                    classroom,
                    &StudentForm {
                        name: row.name,
                        roll: row.roll,
                        email: row.email,
                    },
                )
            });
        match draft {
            Ok(draft) => drafts.push(draft),
            Err(e) => errors.push(format!("Row {}: {}", line, e.user_message())),
        }
    }

    if !errors.is_empty() {
        tracing::warn!("Importação recusada na turma {}: {} linhas inválidas", classroom.id, errors.len());
        let shown: Vec<&str> = errors.iter().take(MAX_REPORTED_ROWS).map(String::as_str).collect();
        return Err(AppError::Validation(format!(
            "Import refused, nothing was added. {}",
            shown.join(" ")
        )));
    }
    if drafts.is_empty() {
        return Err(AppError::Validation("The file has no student rows.".into()));
    }
    Ok(drafts)
}

/// Importa os alunos do CSV para a turma. Nada é gravado se alguma linha for inválida.
pub async fn import_students(store: &SharedStore, classroom: &Classroom, data: &[u8]) -> AppResult<Vec<Student>> {
    let drafts = parse_roster_csv(classroom, data)?;
    let students = Entities::<Student>::new(store.clone());
    let mut created = Vec::with_capacity(drafts.len());
    for draft in &drafts {
        created.push(students.create(draft).await?);
    }
    tracing::info!("✅ {} alunos importados para a turma {}", created.len(), classroom.id);
    Ok(created)
}
