use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20240101_000001_create_stock_records_table::Migration)]
    }
}

mod m20240101_000001_create_stock_records_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_stock_records_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockRecords::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockRecords::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(StockRecords::Sku).string().not_null())
                        .col(ColumnDef::new(StockRecords::Brand).string().not_null())
                        .col(ColumnDef::new(StockRecords::NamaBarang).string().not_null())
                        .col(
                            ColumnDef::new(StockRecords::OwnerCategory)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockRecords::SerialNumber).string().null())
                        .col(
                            ColumnDef::new(StockRecords::KategoriBarang)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockRecords::Lokasi).string().not_null())
                        .col(ColumnDef::new(StockRecords::Jenis).string().not_null())
                        .col(
                            ColumnDef::new(StockRecords::SystemQty)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockRecords::FisikQty).integer().not_null())
                        .col(ColumnDef::new(StockRecords::Keterangan).text().null())
                        .col(ColumnDef::new(StockRecords::UpdatedBy).string().not_null())
                        .col(
                            ColumnDef::new(StockRecords::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockRecords::IsActive)
                                .boolean()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockRecords::BatchId).string().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_records_is_active")
                        .table(StockRecords::Table)
                        .col(StockRecords::IsActive)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_records_batch_id")
                        .table(StockRecords::Table)
                        .col(StockRecords::BatchId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockRecords::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum StockRecords {
        Table,
        Id,
        Sku,
        Brand,
        NamaBarang,
        OwnerCategory,
        SerialNumber,
        KategoriBarang,
        Lokasi,
        Jenis,
        SystemQty,
        FisikQty,
        Keterangan,
        UpdatedBy,
        UpdatedAt,
        IsActive,
        BatchId,
    }
}
