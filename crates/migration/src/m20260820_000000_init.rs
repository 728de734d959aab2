//! Initial schema migration - creates all tables from scratch.
//!
//! The complete schema:
//!
//! - `users`: accounts with argon2 password hashes and a JSON roles column
//! - `places`: places money was spent at
//! - `transactions`: expenses, each linked to a user and a place
//!
//! Index and foreign-key names are load-bearing: the persistence error
//! translator in the service crate matches on them to produce user-facing
//! messages, so renaming them here breaks that mapping.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Name,
    Email,
    PasswordHash,
    Roles,
}

#[derive(Iden)]
enum Places {
    Table,
    Id,
    Name,
    Rating,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    Amount,
    Date,
    PlaceId,
    UserId,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Users::Email).string_len(255).not_null())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(Users::Roles)
                            .string()
                            .not_null()
                            .default("[\"USER\"]"),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_email_unique")
                    .table(Users::Table)
                    .col(Users::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Places
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Places::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Places::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Places::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Places::Rating).integer())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_place_name_unique")
                    .table(Places::Table)
                    .col(Places::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Transactions
        // ───────────────────────────────────────────────────────────────────
        // No cascade on either foreign key: deleting a place or user that is
        // still referenced must fail so the conflict surfaces as a 409.
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::Amount).double().not_null())
                    .col(ColumnDef::new(Transactions::Date).timestamp().not_null())
                    .col(ColumnDef::new(Transactions::PlaceId).integer().not_null())
                    .col(ColumnDef::new(Transactions::UserId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transaction_place")
                            .from(Transactions::Table, Transactions::PlaceId)
                            .to(Places::Table, Places::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transaction_user")
                            .from(Transactions::Table, Transactions::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-user_id")
                    .table(Transactions::Table)
                    .col(Transactions::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-place_id")
                    .table(Transactions::Table)
                    .col(Transactions::PlaceId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Places::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}
