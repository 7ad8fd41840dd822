// src/services/classroom_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        classroom::{Classroom, ClassroomForm, ClassroomSummary, DashboardTotals, NewClassroom},
        student::Student,
        user::User,
    },
    store::{Criteria, Entities, SharedStore},
};
use futures_util::future::try_join_all;
use std::collections::HashSet;

/// Turmas do professor, pela ordem do store.
pub async fn list_for_teacher(store: &SharedStore, teacher: &User) -> AppResult<Vec<Classroom>> {
    tracing::debug!("Buscando turmas de {}", teacher.email);
    Entities::<Classroom>::new(store.clone())
        .filter(&Criteria::new().eq("teacher_email", teacher.email.as_str()), None)
        .await
}

/// Turmas do professor com o número de alunos de cada uma.
///
/// Uma consulta de alunos por turma, todas em paralelo; o resultado segue a
/// ordem das turmas, não a ordem de chegada das respostas.
pub async fn load_dashboard(store: &SharedStore, teacher: &User) -> AppResult<Vec<ClassroomSummary>> {
    let classrooms = list_for_teacher(store, teacher).await?;
    let students = Entities::<Student>::new(store.clone());

    let counts = try_join_all(classrooms.iter().map(|classroom| {
        let students = students.clone();
        let criteria = Criteria::new().eq("classroom_id", classroom.id.as_str());
        async move { students.filter(&criteria, None).await.map(|s| s.len()) }
    }))
    .await?;

    let summaries: Vec<ClassroomSummary> = classrooms
        .into_iter()
        .zip(counts)
        .map(|(classroom, student_count)| ClassroomSummary {
            classroom,
            student_count,
        })
        .collect();
    tracing::debug!("Dashboard de {}: {} turmas.", teacher.email, summaries.len());
    Ok(summaries)
}

/// Totais do dashboard. Disciplinas distintas por igualdade exata ("Math" != "math").
pub fn dashboard_totals(summaries: &[ClassroomSummary]) -> DashboardTotals {
    let subjects: HashSet<&str> = summaries
        .iter()
        .map(|s| s.classroom.subject.as_str())
        .collect();
    DashboardTotals {
        classrooms: summaries.len(),
        students: summaries.iter().map(|s| s.student_count).sum(),
        subjects: subjects.len(),
    }
}

pub async fn create_classroom(
    store: &SharedStore,
    teacher: &User,
    form: &ClassroomForm,
) -> AppResult<Classroom> {
    let name = form.name.trim();
    let subject = form.subject.trim();
    if name.is_empty() || subject.is_empty() {
        return Err(AppError::Validation("Classroom name and subject are required.".into()));
    }
    let description = form
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    let classroom = Entities::<Classroom>::new(store.clone())
        .create(&NewClassroom {
            name: name.to_string(),
            subject: subject.to_string(),
            description,
            teacher_email: teacher.email.clone(),
        })
        .await?;
    tracing::info!("✅ Turma '{}' ({}) criada por {}", classroom.name, classroom.id, teacher.email);
    Ok(classroom)
}

/// Turma pelo id, desde que pertença ao professor. Turmas de outros contam como inexistentes.
pub async fn find_owned(store: &SharedStore, teacher: &User, id: &str) -> AppResult<Classroom> {
    match Entities::<Classroom>::new(store.clone()).find(id).await? {
        Some(classroom) if classroom.teacher_email == teacher.email => Ok(classroom),
        Some(_) => {
            tracing::warn!("{} tentou aceder à turma {} de outro professor", teacher.email, id);
            Err(AppError::NotFound(format!("Classroom {}", id)))
        }
        None => Err(AppError::NotFound(format!("Classroom {}", id))),
    }
}

/// Apaga a turma com uma única chamada ao store; alunos e registos de
/// presença vão em cascata do lado do store.
pub async fn delete_classroom(store: &SharedStore, teacher: &User, id: &str) -> AppResult<()> {
    let classroom = find_owned(store, teacher, id).await?;
    Entities::<Classroom>::new(store.clone())
        .delete(&classroom.id)
        .await?;
    tracing::info!("🗑️ Turma '{}' ({}) apagada por {}", classroom.name, classroom.id, teacher.email);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(subject: &str, student_count: usize) -> ClassroomSummary {
        ClassroomSummary {
            classroom: Classroom {
                id: format!("{}-{}", subject, student_count),
                name: "Turma".into(),
                subject: subject.into(),
                description: None,
                teacher_email: "t@x.com".into(),
            },
            student_count,
        }
    }

    #[test]
    fn totals_sum_students_and_count_exact_subjects() {
        let totals = dashboard_totals(&[summary("Math", 3), summary("math", 0), summary("Math", 5)]);
        assert_eq!(
            totals,
            DashboardTotals {
                classrooms: 3,
                students: 8,
                subjects: 2,
            }
        );
    }

    #[test]
    fn totals_of_empty_dashboard_are_zero() {
        assert_eq!(dashboard_totals(&[]), DashboardTotals::default());
    }
}
