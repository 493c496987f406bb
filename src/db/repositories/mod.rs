mod answer_repository;
mod question_repository;
mod quiz_repository;
mod section_repository;
mod user_repository;
mod value_repository;

pub use answer_repository::AnswerRepository;
pub use question_repository::QuestionRepository;
pub use quiz_repository::QuizRepository;
pub use section_repository::SectionRepository;
pub use user_repository::UserRepository;
pub use value_repository::ValueRepository;
