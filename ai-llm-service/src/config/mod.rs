pub mod ai_settings;
pub mod generation_params;
pub mod model_role;
