pub mod catalog;
pub mod course_service;
pub mod lesson_service;
pub mod module_service;
pub mod program_service;
pub mod progress_service;

pub use course_service::CourseService;
pub use lesson_service::LessonService;
pub use module_service::ModuleService;
pub use program_service::ProgramService;
pub use progress_service::ProgressService;
