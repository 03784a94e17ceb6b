pub mod evaluation_service;
pub mod exam_service;
pub mod generation_service;
pub mod grading_service;
pub mod llm_service;
