pub mod event_service;
pub mod maintenance_service;
pub mod ownership_service;
pub mod redis_service;
pub mod relation_service;
pub mod tag_group_service;
pub mod tag_service;
