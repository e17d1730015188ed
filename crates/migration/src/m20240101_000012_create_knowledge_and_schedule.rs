//! Create `knowledge_article` and calendar `schedule` tables.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(KnowledgeArticle::Table)
                    .if_not_exists()
                    .col(uuid(KnowledgeArticle::Id).primary_key())
                    .col(string_len(KnowledgeArticle::Title, 255).not_null())
                    .col(string_len_null(KnowledgeArticle::Author, 128))
                    .col(text(KnowledgeArticle::Content).default(""))
                    .col(array(KnowledgeArticle::Categories, ColumnType::Text).default(Expr::cust("'{}'")))
                    .col(array(KnowledgeArticle::Tags, ColumnType::Text).default(Expr::cust("'{}'")))
                    .col(array(KnowledgeArticle::Keywords, ColumnType::Text).default(Expr::cust("'{}'")))
                    .col(timestamp_with_time_zone(KnowledgeArticle::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(KnowledgeArticle::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Schedule::Table)
                    .if_not_exists()
                    .col(uuid(Schedule::Id).primary_key())
                    .col(string_len(Schedule::Title, 255).not_null())
                    .col(string_len(Schedule::Category, 32).not_null().default("work"))
                    .col(timestamp_with_time_zone(Schedule::StartTime).not_null())
                    .col(timestamp_with_time_zone_null(Schedule::EndTime))
                    .col(string_len_null(Schedule::Location, 255))
                    .col(text_null(Schedule::Description))
                    .col(timestamp_with_time_zone(Schedule::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Schedule::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Schedule::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(KnowledgeArticle::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum KnowledgeArticle { Table, Id, Title, Author, Content, Categories, Tags, Keywords, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Schedule { Table, Id, Title, Category, StartTime, EndTime, Location, Description, CreatedAt, UpdatedAt }
