//! services/client/src/adapters/http.rs
//!
//! This module contains the REST adapter for the study helper backend. It is the
//! concrete implementation of the `QuizGateway` and `MaterialGateway` ports and
//! handles all HTTP interactions with the backend using `reqwest`.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use study_helper_core::domain::{
    AnswerSet, CourseId, Material, MaterialId, NewQuiz, Question, QuickCreateRequest,
    QuickCreateResponse, QuickCreateStatus, Quiz, QuizId, QuizResult,
};
use study_helper_core::ports::{MaterialGateway, PortError, PortResult, QuizGateway};
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the backend ports over the REST API.
#[derive(Clone)]
pub struct HttpBackendAdapter {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpBackendAdapter {
    /// Creates a new `HttpBackendAdapter`. `base_url` must end with a `/`.
    pub fn new(client: Client, base_url: Url, token: Option<String>) -> Self {
        Self {
            client,
            base_url,
            token,
        }
    }

    fn request(&self, method: Method, path: &str) -> PortResult<RequestBuilder> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| PortError::Unexpected(format!("invalid endpoint '{}': {}", path, e)))?;
        debug!("{} {}", method, url);
        let builder = self.client.request(method, url);
        Ok(match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> PortResult<T> {
        let response = builder.send().await.map_err(transport_error)?;
        let response = check_status(response).await?;
        response.json::<T>().await.map_err(transport_error)
    }
}

//=========================================================================================
// Response Mapping Helpers
//=========================================================================================

/// Maps a non-success response onto the port error taxonomy.
pub(crate) async fn check_status(response: Response) -> PortResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let path = response.url().path().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::NOT_FOUND => PortError::NotFound(path),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PortError::Unauthorized,
        StatusCode::BAD_REQUEST => PortError::Validation(body),
        _ => PortError::Transport(format!("{} returned {}: {}", path, status, body)),
    })
}

pub(crate) fn transport_error(e: reqwest::Error) -> PortError {
    if e.is_timeout() {
        PortError::Transport(format!("request timed out: {}", e))
    } else {
        PortError::Transport(e.to_string())
    }
}

//=========================================================================================
// `QuizGateway` Trait Implementation
//=========================================================================================

#[async_trait]
impl QuizGateway for HttpBackendAdapter {
    async fn list_quizzes(&self, course_id: CourseId) -> PortResult<Vec<Quiz>> {
        let path = format!("api-quiz/courses/{}/quizzes/", course_id);
        self.fetch(self.request(Method::GET, &path)?).await
    }

    async fn create_quiz(&self, course_id: CourseId, quiz: &NewQuiz) -> PortResult<Quiz> {
        let path = format!("api-quiz/courses/{}/quizzes/", course_id);
        self.fetch(self.request(Method::POST, &path)?.json(quiz)).await
    }

    async fn delete_quiz(&self, quiz_id: QuizId) -> PortResult<Quiz> {
        let path = format!("api-quiz/quizzes/{}/delete/", quiz_id);
        self.fetch(self.request(Method::DELETE, &path)?).await
    }

    async fn generate_questions(&self, quiz_id: QuizId) -> PortResult<Quiz> {
        let path = format!("api-quiz/quizzes/{}/generate-questions/", quiz_id);
        self.fetch(self.request(Method::POST, &path)?).await
    }

    async fn list_questions(&self, quiz_id: QuizId) -> PortResult<Vec<Question>> {
        let path = format!("api-quiz/quizzes/{}/questions/", quiz_id);
        self.fetch(self.request(Method::GET, &path)?).await
    }

    async fn get_quiz(&self, quiz_id: QuizId) -> PortResult<Quiz> {
        let path = format!("api-quiz/quizzes/{}/", quiz_id);
        self.fetch(self.request(Method::GET, &path)?).await
    }

    async fn check_answers(&self, quiz_id: QuizId, answers: &AnswerSet) -> PortResult<QuizResult> {
        let path = format!("api-quiz/quizzes/{}/check-answers/", quiz_id);
        self.fetch(self.request(Method::POST, &path)?.json(answers)).await
    }

    async fn quick_create(&self, request: &QuickCreateRequest) -> PortResult<QuickCreateResponse> {
        self.fetch(self.request(Method::POST, "api-quiz/quick-create/")?.json(request))
            .await
    }

    async fn quick_create_status(&self, quiz_id: QuizId) -> PortResult<QuickCreateStatus> {
        let path = format!("api-quiz/quick-create/{}/", quiz_id);
        self.fetch(self.request(Method::GET, &path)?).await
    }
}

//=========================================================================================
// `MaterialGateway` Trait Implementation
//=========================================================================================

#[async_trait]
impl MaterialGateway for HttpBackendAdapter {
    async fn list_materials(&self, course_id: CourseId) -> PortResult<Vec<Material>> {
        let path = format!("api/courses/{}/materials/", course_id);
        self.fetch(self.request(Method::GET, &path)?).await
    }

    async fn get_material(&self, material_id: MaterialId) -> PortResult<Material> {
        let path = format!("api/materials/{}/", material_id);
        self.fetch(self.request(Method::GET, &path)?).await
    }

    async fn delete_material(&self, course_id: CourseId, material_id: MaterialId) -> PortResult<()> {
        let path = format!("api/courses/{}/materials/{}/", course_id, material_id);
        let response = self
            .request(Method::DELETE, &path)?
            .send()
            .await
            .map_err(transport_error)?;
        // The backend answers 204 No Content.
        check_status(response).await.map(|_| ())
    }
}
