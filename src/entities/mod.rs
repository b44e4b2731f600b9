pub mod tag;
pub mod tag_group;
pub mod tag_owner;
pub mod tagged_object;
