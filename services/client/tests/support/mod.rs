#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use study_helper_core::domain::{
    AnswerSet, Blob, CourseId, Material, MaterialId, NewQuiz, Question, QuestionOption,
    QuestionResult, QuestionType, QuickCreateRequest, QuickCreateResponse, QuickCreateStatus, Quiz,
    QuizId, QuizResult, QuizStatus,
};
use study_helper_core::ports::{
    MaterialGateway, PortError, PortResult, QuizGateway, StorageService,
};
use tokio::sync::Notify;

//=========================================================================================
// Fixtures
//=========================================================================================

pub fn material(id: MaterialId, file_name: &str) -> Material {
    Material {
        id,
        file_name: file_name.to_string(),
        file_type: Some("application/pdf".to_string()),
        file_size: Some(2_500_000),
        uploaded_at: None,
        material_file_url: format!("2025-06-05T08:55:05_{}", file_name),
    }
}

pub fn quiz(id: QuizId, number_of_questions: u32) -> Quiz {
    Quiz {
        id,
        title: format!("Quiz {}", id),
        course_id: 3,
        number_of_questions,
        time_limit_minutes: None,
        status: QuizStatus::Completed,
    }
}

pub fn mcq(id: u64, quiz_id: QuizId) -> Question {
    Question {
        id,
        quiz_id,
        question: format!("Question {}", id),
        question_type: QuestionType::Mcq,
        options: (1..=4)
            .map(|n| QuestionOption {
                id: id * 10 + n,
                text: format!("option {}", n),
            })
            .collect(),
    }
}

pub fn true_false(id: u64, quiz_id: QuizId) -> Question {
    Question {
        id,
        quiz_id,
        question: format!("Statement {}", id),
        question_type: QuestionType::TrueFalse,
        options: Vec::new(),
    }
}

pub fn generating(quiz_id: QuizId) -> PortResult<QuickCreateStatus> {
    Ok(QuickCreateStatus {
        quiz_id,
        quiz_title: None,
        status: QuizStatus::Generating,
        message: Some("Quiz is still being generated".to_string()),
        quiz: None,
        questions: None,
    })
}

pub fn completed(quiz_id: QuizId, questions: usize) -> PortResult<QuickCreateStatus> {
    Ok(QuickCreateStatus {
        quiz_id,
        quiz_title: Some(format!("Quiz {}", quiz_id)),
        status: QuizStatus::Completed,
        message: None,
        quiz: Some(quiz(quiz_id, questions as u32)),
        questions: Some((1..=questions as u64).map(|id| mcq(id, quiz_id)).collect()),
    })
}

//=========================================================================================
// Quiz backend
//=========================================================================================

/// Answers status checks from a script. The last entry repeats once the script runs out.
#[derive(Default)]
pub struct ScriptedQuizzes {
    statuses: Mutex<VecDeque<PortResult<QuickCreateStatus>>>,
    polls: AtomicUsize,
    submissions: AtomicUsize,
    /// Holds status check number `n` (one-based) until released.
    hold: Mutex<Option<(usize, Arc<Notify>, Arc<Notify>)>>,
}

impl ScriptedQuizzes {
    pub fn new(statuses: Vec<PortResult<QuickCreateStatus>>) -> Arc<Self> {
        Arc::new(Self {
            statuses: Mutex::new(statuses.into()),
            ..Self::default()
        })
    }

    /// Returns `(entered, release)`: the poll signals `entered` and waits for `release`.
    pub fn hold_poll(&self, n: usize) -> (Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        *self.hold.lock() = Some((n, entered.clone(), release.clone()));
        (entered, release)
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    fn next_status(&self) -> PortResult<QuickCreateStatus> {
        let mut statuses = self.statuses.lock();
        if statuses.len() > 1 {
            statuses.pop_front().unwrap_or_else(|| generating(0))
        } else {
            statuses.front().cloned().unwrap_or_else(|| generating(0))
        }
    }
}

#[async_trait]
impl QuizGateway for ScriptedQuizzes {
    async fn list_quizzes(&self, _course_id: CourseId) -> PortResult<Vec<Quiz>> {
        Ok(vec![quiz(1, 5)])
    }

    async fn create_quiz(&self, _course_id: CourseId, new: &NewQuiz) -> PortResult<Quiz> {
        let mut created = quiz(21, new.number_of_questions);
        created.title = new.quiz_title.clone();
        created.status = QuizStatus::Generating;
        Ok(created)
    }

    async fn delete_quiz(&self, quiz_id: QuizId) -> PortResult<Quiz> {
        Ok(quiz(quiz_id, 5))
    }

    async fn generate_questions(&self, quiz_id: QuizId) -> PortResult<Quiz> {
        let mut started = quiz(quiz_id, 5);
        started.status = QuizStatus::Generating;
        Ok(started)
    }

    async fn list_questions(&self, quiz_id: QuizId) -> PortResult<Vec<Question>> {
        Ok((1..=5).map(|id| mcq(id, quiz_id)).collect())
    }

    async fn get_quiz(&self, quiz_id: QuizId) -> PortResult<Quiz> {
        Ok(quiz(quiz_id, 5))
    }

    /// Option `a` and `true` are correct.
    async fn check_answers(&self, _quiz_id: QuizId, answers: &AnswerSet) -> PortResult<QuizResult> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        Ok(QuizResult {
            items: answers
                .iter()
                .map(|(question_id, value)| QuestionResult {
                    question_id: *question_id,
                    is_correct: value == "a" || value == "true",
                    correct_answer: None,
                })
                .collect(),
        })
    }

    async fn quick_create(&self, request: &QuickCreateRequest) -> PortResult<QuickCreateResponse> {
        if request.material_file_url.is_empty() {
            return Err(PortError::Validation("material_file_url is required".to_string()));
        }
        Ok(QuickCreateResponse {
            message: Some("Quiz generation started".to_string()),
            quiz_id: 7,
            quiz_title: request.quiz_title.clone(),
            number_of_questions: request.number_of_questions,
            status: QuizStatus::Generating,
        })
    }

    async fn quick_create_status(&self, _quiz_id: QuizId) -> PortResult<QuickCreateStatus> {
        let n = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
        let hold = self.hold.lock().clone();
        if let Some((at, entered, release)) = hold {
            if at == n {
                entered.notify_one();
                release.notified().await;
            }
        }
        self.next_status()
    }
}

//=========================================================================================
// Materials and storage
//=========================================================================================

#[derive(Default)]
pub struct FakeMaterials {
    materials: Mutex<Vec<Material>>,
    deleted: Mutex<Vec<MaterialId>>,
}

impl FakeMaterials {
    pub fn new(materials: Vec<Material>) -> Arc<Self> {
        Arc::new(Self {
            materials: Mutex::new(materials),
            ..Self::default()
        })
    }

    pub fn add(&self, material: Material) {
        self.materials.lock().push(material);
    }

    pub fn deleted(&self) -> Vec<MaterialId> {
        self.deleted.lock().clone()
    }
}

#[async_trait]
impl MaterialGateway for FakeMaterials {
    async fn list_materials(&self, _course_id: CourseId) -> PortResult<Vec<Material>> {
        Ok(self.materials.lock().clone())
    }

    async fn get_material(&self, material_id: MaterialId) -> PortResult<Material> {
        self.materials
            .lock()
            .iter()
            .find(|m| m.id == material_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("/api/materials/{}/", material_id)))
    }

    async fn delete_material(&self, _course_id: CourseId, material_id: MaterialId) -> PortResult<()> {
        let mut materials = self.materials.lock();
        let before = materials.len();
        materials.retain(|m| m.id != material_id);
        if materials.len() == before {
            return Err(PortError::NotFound(format!("material {}", material_id)));
        }
        self.deleted.lock().push(material_id);
        Ok(())
    }
}

/// Serves every reference as a small PDF after `latency`. References listed in
/// `failing` answer with a transport error.
#[derive(Default)]
pub struct FakeStorage {
    latency: Duration,
    failing: Mutex<Vec<String>>,
    downloads: AtomicUsize,
}

impl FakeStorage {
    pub fn new(latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            latency,
            ..Self::default()
        })
    }

    pub fn fail(&self, reference: &str) {
        self.failing.lock().push(reference.to_string());
    }

    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageService for FakeStorage {
    async fn download(&self, reference: &str) -> PortResult<Blob> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.failing.lock().iter().any(|r| r == reference) {
            return Err(PortError::Transport(format!("storage refused '{}'", reference)));
        }
        Ok(Blob {
            data: Bytes::from(format!("%PDF-1.7 {}", reference)),
            content_type: "application/pdf".to_string(),
        })
    }
}
