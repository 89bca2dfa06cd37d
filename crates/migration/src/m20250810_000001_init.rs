//! Initial schema migration - creates all tables from scratch.
//!
//! - `users`: authentication
//! - `accounts`: balances, one or more per user
//! - `transactions`: money movements with fee and status
//! - `transaction_logs`: append-only audit trail of status transitions
//! - `recurring_transactions`: schedule definitions for the due-scan

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Users {
    Table,
    Username,
    Password,
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    Owner,
    AccountNumber,
    Kind,
    Balance,
    AvailableBalance,
    Status,
    IsPrimary,
    CreatedAt,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    Reference,
    AccountId,
    Amount,
    FeeAmount,
    Kind,
    Status,
    Category,
    Description,
    RecipientAccountNumber,
    RecipientName,
    ProcessedAt,
    FailureReason,
    ExternalReference,
    CreatedAt,
}

#[derive(Iden)]
enum TransactionLogs {
    Table,
    Id,
    TransactionId,
    PreviousStatus,
    NewStatus,
    Message,
    ProcessedBy,
    CreatedAt,
}

#[derive(Iden)]
enum RecurringTransactions {
    Table,
    Id,
    AccountId,
    Amount,
    Description,
    Category,
    RecipientAccountNumber,
    RecipientName,
    Frequency,
    StartDate,
    EndDate,
    NextExecutionDate,
    Status,
    ExecutionCount,
    MaxExecutions,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::Owner).string().not_null())
                    .col(
                        ColumnDef::new(Accounts::AccountNumber)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Accounts::Kind).string().not_null())
                    .col(ColumnDef::new(Accounts::Balance).big_integer().not_null())
                    .col(
                        ColumnDef::new(Accounts::AvailableBalance)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Accounts::Status).string().not_null())
                    .col(ColumnDef::new(Accounts::IsPrimary).boolean().not_null())
                    .col(ColumnDef::new(Accounts::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-accounts-owner")
                            .from(Accounts::Table, Accounts::Owner)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-account_number")
                    .table(Accounts::Table)
                    .col(Accounts::AccountNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-owner")
                    .table(Accounts::Table)
                    .col(Accounts::Owner)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::Reference).string().not_null())
                    .col(ColumnDef::new(Transactions::AccountId).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::FeeAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(ColumnDef::new(Transactions::Status).string().not_null())
                    .col(ColumnDef::new(Transactions::Category).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::Description)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::RecipientAccountNumber).string())
                    .col(ColumnDef::new(Transactions::RecipientName).string())
                    .col(ColumnDef::new(Transactions::ProcessedAt).timestamp())
                    .col(ColumnDef::new(Transactions::FailureReason).string())
                    .col(ColumnDef::new(Transactions::ExternalReference).string())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-account_id")
                            .from(Transactions::Table, Transactions::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-reference")
                    .table(Transactions::Table)
                    .col(Transactions::Reference)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-account_id-created_at")
                    .table(Transactions::Table)
                    .col(Transactions::AccountId)
                    .col(Transactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-status")
                    .table(Transactions::Table)
                    .col(Transactions::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TransactionLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TransactionLogs::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TransactionLogs::TransactionId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransactionLogs::PreviousStatus)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransactionLogs::NewStatus)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TransactionLogs::Message).string().not_null())
                    .col(
                        ColumnDef::new(TransactionLogs::ProcessedBy)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransactionLogs::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transaction_logs-transaction_id")
                            .from(TransactionLogs::Table, TransactionLogs::TransactionId)
                            .to(Transactions::Table, Transactions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transaction_logs-transaction_id")
                    .table(TransactionLogs::Table)
                    .col(TransactionLogs::TransactionId)
                    .to_owned(),
            )
            .await?;

        // Pruning scans by age.
        manager
            .create_index(
                Index::create()
                    .name("idx-transaction_logs-created_at")
                    .table(TransactionLogs::Table)
                    .col(TransactionLogs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RecurringTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RecurringTransactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RecurringTransactions::AccountId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecurringTransactions::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecurringTransactions::Description)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecurringTransactions::Category)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RecurringTransactions::RecipientAccountNumber).string())
                    .col(ColumnDef::new(RecurringTransactions::RecipientName).string())
                    .col(
                        ColumnDef::new(RecurringTransactions::Frequency)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecurringTransactions::StartDate)
                            .date()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RecurringTransactions::EndDate).date())
                    .col(
                        ColumnDef::new(RecurringTransactions::NextExecutionDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecurringTransactions::Status)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecurringTransactions::ExecutionCount)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RecurringTransactions::MaxExecutions).integer())
                    .col(
                        ColumnDef::new(RecurringTransactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-recurring_transactions-account_id")
                            .from(
                                RecurringTransactions::Table,
                                RecurringTransactions::AccountId,
                            )
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // The due-scan filters on (status, next_execution_date).
        manager
            .create_index(
                Index::create()
                    .name("idx-recurring_transactions-status-next_execution_date")
                    .table(RecurringTransactions::Table)
                    .col(RecurringTransactions::Status)
                    .col(RecurringTransactions::NextExecutionDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RecurringTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TransactionLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
