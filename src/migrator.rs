use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20240101_000001_create_categories_table::Migration)]
    }
}

// Migration implementations

mod m20240101_000001_create_categories_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_categories_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create categories table aligned with entities::category Model
            manager
                .create_table(
                    Table::create()
                        .table(Categories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Categories::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Categories::Name).string().not_null())
                        .col(ColumnDef::new(Categories::ParentId).uuid().null())
                        .col(ColumnDef::new(Categories::Level).integer().not_null())
                        .col(
                            ColumnDef::new(Categories::SortOrder)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Categories::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Categories::Description).string().null())
                        .col(ColumnDef::new(Categories::ImageUrl).string().null())
                        .col(ColumnDef::new(Categories::CreatedBy).uuid().null())
                        .col(ColumnDef::new(Categories::UpdatedBy).uuid().null())
                        .col(
                            ColumnDef::new(Categories::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Categories::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            // Listing and navigation indexes; (name, level) is deliberately
            // non-unique so duplicate names at the same level stay legal.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_categories_level_active_sort")
                        .table(Categories::Table)
                        .col(Categories::Level)
                        .col(Categories::IsActive)
                        .col(Categories::SortOrder)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_categories_parent_active_sort")
                        .table(Categories::Table)
                        .col(Categories::ParentId)
                        .col(Categories::IsActive)
                        .col(Categories::SortOrder)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_categories_name_level")
                        .table(Categories::Table)
                        .col(Categories::Name)
                        .col(Categories::Level)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Categories::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Categories {
        Table,
        Id,
        Name,
        ParentId,
        Level,
        SortOrder,
        IsActive,
        Description,
        ImageUrl,
        CreatedBy,
        UpdatedBy,
        CreatedAt,
        UpdatedAt,
    }
}
