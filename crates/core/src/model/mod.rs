mod question;
mod session;
mod token;

pub use question::{Question, QuestionError};
pub use session::{QuizSession, SessionError};
pub use token::{Operator, Token};
