use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 1. Tag groups
        manager
            .create_table(
                Table::create()
                    .table(TagGroups::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TagGroups::Id).big_integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(TagGroups::PublicId).uuid().not_null().unique_key())
                    .col(ColumnDef::new(TagGroups::Name).string_len(50).not_null())
                    .col(ColumnDef::new(TagGroups::Slug).string_len(30).not_null().unique_key())
                    .col(ColumnDef::new(TagGroups::Level).string().not_null().default("system"))
                    .col(ColumnDef::new(TagGroups::Type).string().not_null().default("simple"))
                    .col(ColumnDef::new(TagGroups::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(TagGroups::UpdatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        // 2. Tags
        manager
            .create_table(
                Table::create()
                    .table(Tags::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tags::Id).big_integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Tags::PublicId).uuid().not_null().unique_key())
                    .col(ColumnDef::new(Tags::Name).string_len(50).not_null())
                    .col(ColumnDef::new(Tags::Description).string_len(300).null())
                    .col(ColumnDef::new(Tags::Logo).string().null())
                    .col(ColumnDef::new(Tags::TagGroupId).big_integer().not_null())
                    .col(ColumnDef::new(Tags::TaggedObjectsCount).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Tags::IsSystemTag).boolean().not_null().default(false))
                    .col(ColumnDef::new(Tags::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Tags::UpdatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tags_tag_group_id")
                            .from(Tags::Table, Tags::TagGroupId)
                            .to(TagGroups::Table, TagGroups::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tags_group_count")
                    .table(Tags::Table)
                    .col(Tags::TagGroupId)
                    .col(Tags::TaggedObjectsCount)
                    .to_owned(),
            )
            .await?;

        // 3. Ordered owner list of a tag
        manager
            .create_table(
                Table::create()
                    .table(TagOwners::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TagOwners::TagId).big_integer().not_null())
                    .col(ColumnDef::new(TagOwners::Position).integer().not_null())
                    .col(ColumnDef::new(TagOwners::OwnerId).string().not_null())
                    .col(ColumnDef::new(TagOwners::OwnerType).string().not_null())
                    .primary_key(Index::create().col(TagOwners::TagId).col(TagOwners::Position))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tag_owners_tag_id")
                            .from(TagOwners::Table, TagOwners::TagId)
                            .to(Tags::Table, Tags::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tag_owners_owner_id")
                    .table(TagOwners::Table)
                    .col(TagOwners::OwnerId)
                    .to_owned(),
            )
            .await?;

        // 4. Relation rows. Tag deletion must clear these first, hence Restrict.
        manager
            .create_table(
                Table::create()
                    .table(TaggedObjects::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TaggedObjects::Id).big_integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(TaggedObjects::TagId).big_integer().not_null())
                    .col(ColumnDef::new(TaggedObjects::ObjectId).string_len(128).not_null())
                    .col(ColumnDef::new(TaggedObjects::TagGroupId).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tagged_objects_tag_id")
                            .from(TaggedObjects::Table, TaggedObjects::TagId)
                            .to(Tags::Table, Tags::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tagged_objects_tag_group_id")
                            .from(TaggedObjects::Table, TaggedObjects::TagGroupId)
                            .to(TagGroups::Table, TagGroups::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tagged_objects_unique")
                    .table(TaggedObjects::Table)
                    .col(TaggedObjects::ObjectId)
                    .col(TaggedObjects::TagGroupId)
                    .col(TaggedObjects::TagId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tagged_objects_group_tag")
                    .table(TaggedObjects::Table)
                    .col(TaggedObjects::TagGroupId)
                    .col(TaggedObjects::TagId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(TaggedObjects::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(TagOwners::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Tags::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(TagGroups::Table).to_owned()).await
    }
}

#[derive(Iden)]
enum TagGroups {
    Table,
    Id,
    PublicId,
    Name,
    Slug,
    Level,
    Type,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Tags {
    Table,
    Id,
    PublicId,
    Name,
    Description,
    Logo,
    TagGroupId,
    TaggedObjectsCount,
    IsSystemTag,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum TagOwners {
    Table,
    TagId,
    Position,
    OwnerId,
    OwnerType,
}

#[derive(Iden)]
enum TaggedObjects {
    Table,
    Id,
    TagId,
    ObjectId,
    TagGroupId,
}
