pub mod tag_seeder;

use sea_orm::{DatabaseConnection, DbErr};

pub async fn run_seeders(db: &DatabaseConnection) -> Result<(), DbErr> {
    // 1. Seed Tag Groups (system tags need their group)
    tag_seeder::seed_tag_groups(db).await?;

    // 2. Seed System Tags
    tag_seeder::seed_system_tags(db).await?;

    Ok(())
}
