use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tickets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tickets::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tickets::FullName).string().not_null())
                    .col(ColumnDef::new(Tickets::FullNameKey).string().not_null())
                    .col(ColumnDef::new(Tickets::Surname).string().not_null())
                    .col(ColumnDef::new(Tickets::TicketType).string().not_null())
                    .col(ColumnDef::new(Tickets::Price).integer().not_null())
                    .col(
                        ColumnDef::new(Tickets::Repost)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Tickets::Seller).string().not_null())
                    .col(
                        ColumnDef::new(Tickets::PassedControlZone)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Tickets::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // One ticket per buyer
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tickets_full_name_key")
                    .table(Tickets::Table)
                    .col(Tickets::FullNameKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Surname prefix search at the entrance
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tickets_surname")
                    .table(Tickets::Table)
                    .col(Tickets::Surname)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tickets::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Tickets {
    Table,
    Id,
    FullName,
    FullNameKey,
    Surname,
    TicketType,
    Price,
    Repost,
    Seller,
    PassedControlZone,
    CreatedAt,
}
