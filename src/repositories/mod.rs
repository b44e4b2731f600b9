pub mod tag_group_repository;
pub mod tag_repository;
pub mod tagged_object_repository;
