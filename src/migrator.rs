use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240105_000001_create_reference_tables::Migration),
            Box::new(m20240105_000002_create_inventory_table::Migration),
            Box::new(m20240105_000003_create_shipment_tables::Migration),
            Box::new(m20240105_000004_create_order_tables::Migration),
            Box::new(m20240105_000005_create_wallet_tables::Migration),
            Box::new(m20240105_000006_create_stock_ledger_tables::Migration),
            Box::new(m20240105_000007_create_delivery_and_misc_tables::Migration),
        ]
    }
}

// Migration implementations

mod m20240105_000001_create_reference_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240105_000001_create_reference_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Categories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Categories::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Categories::Name).string().not_null())
                        .col(ColumnDef::new(Categories::Description).string().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Suppliers::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Suppliers::Name).string().not_null())
                        .col(ColumnDef::new(Suppliers::ContactPerson).string().not_null())
                        .col(ColumnDef::new(Suppliers::Email).string().not_null())
                        .col(ColumnDef::new(Suppliers::Phone).string().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Warehouses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Warehouses::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Warehouses::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Warehouses::WarehouseLocation)
                                .string()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Locations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Locations::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Locations::WarehouseId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Locations::Name).string().not_null())
                        .col(ColumnDef::new(Locations::Aisle).string().not_null())
                        .col(ColumnDef::new(Locations::Rack).string().not_null())
                        .col(ColumnDef::new(Locations::Level).string().not_null())
                        .col(
                            ColumnDef::new(Locations::Barcode)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Locations::Capacity).integer().not_null())
                        .col(
                            ColumnDef::new(Locations::IsStagingArea)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Products::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::Description).string().not_null())
                        .col(ColumnDef::new(Products::CategoryId).big_integer().not_null())
                        .col(ColumnDef::new(Products::SupplierId).big_integer().not_null())
                        .col(
                            ColumnDef::new(Products::Size)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::Price)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::Barcode)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_category_id")
                        .table(Products::Table)
                        .col(Products::CategoryId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_locations_warehouse_id")
                        .table(Locations::Table)
                        .col(Locations::WarehouseId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Locations::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Warehouses::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Suppliers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Categories::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Categories {
        Table,
        Id,
        Name,
        Description,
    }

    #[derive(DeriveIden)]
    enum Suppliers {
        Table,
        Id,
        Name,
        ContactPerson,
        Email,
        Phone,
    }

    #[derive(DeriveIden)]
    enum Warehouses {
        Table,
        Id,
        Name,
        WarehouseLocation,
    }

    #[derive(DeriveIden)]
    enum Locations {
        Table,
        Id,
        WarehouseId,
        Name,
        Aisle,
        Rack,
        Level,
        Barcode,
        Capacity,
        IsStagingArea,
    }

    #[derive(DeriveIden)]
    enum Products {
        Table,
        Id,
        Name,
        Description,
        CategoryId,
        SupplierId,
        Size,
        Price,
        Barcode,
    }
}

mod m20240105_000002_create_inventory_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240105_000002_create_inventory_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Inventory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Inventory::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Inventory::ProductId).big_integer().not_null())
                        .col(
                            ColumnDef::new(Inventory::LocationId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Inventory::Quantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Inventory::Status).string_len(20).not_null())
                        .col(ColumnDef::new(Inventory::ExpiryDate).date().null())
                        .col(ColumnDef::new(Inventory::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Inventory::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            // Balances are looked up by (product, location) on every
            // fulfillment operation. The index is deliberately non-unique:
            // staging-area receipts append one row per receipt.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_product_location")
                        .table(Inventory::Table)
                        .col(Inventory::ProductId)
                        .col(Inventory::LocationId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_location_id")
                        .table(Inventory::Table)
                        .col(Inventory::LocationId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Inventory::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Inventory {
        Table,
        Id,
        ProductId,
        LocationId,
        Quantity,
        Status,
        ExpiryDate,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240105_000003_create_shipment_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240105_000003_create_shipment_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Shipments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Shipments::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Shipments::SupplierId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Shipments::ArrivalDate).date().not_null())
                        .col(ColumnDef::new(Shipments::ReceiveDate).timestamp().null())
                        .col(ColumnDef::new(Shipments::Status).string_len(20).not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ShipmentDetails::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ShipmentDetails::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ShipmentDetails::ShipmentId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ShipmentDetails::ProductId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ShipmentDetails::PriceAtShipment)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(ShipmentDetails::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(ShipmentDetails::Status)
                                .string_len(20)
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_shipment_details_shipment_id")
                        .table(ShipmentDetails::Table)
                        .col(ShipmentDetails::ShipmentId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_shipment_details_status")
                        .table(ShipmentDetails::Table)
                        .col(ShipmentDetails::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ShipmentDetails::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Shipments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Shipments {
        Table,
        Id,
        SupplierId,
        ArrivalDate,
        ReceiveDate,
        Status,
    }

    #[derive(DeriveIden)]
    enum ShipmentDetails {
        Table,
        Id,
        ShipmentId,
        ProductId,
        PriceAtShipment,
        Quantity,
        Status,
    }
}

mod m20240105_000004_create_order_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240105_000004_create_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Orders::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Orders::CustomerId).big_integer().not_null())
                        .col(
                            ColumnDef::new(Orders::TotalPrice)
                                .decimal_len(10, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Orders::Status).string_len(20).not_null())
                        .col(ColumnDef::new(Orders::Priority).string_len(20).not_null())
                        .col(ColumnDef::new(Orders::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Orders::UpdatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Orders::DeliveredAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_customer_id")
                        .table(Orders::Table)
                        .col(Orders::CustomerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_status")
                        .table(Orders::Table)
                        .col(Orders::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderDetails::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderDetails::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderDetails::OrderId).big_integer().not_null())
                        .col(
                            ColumnDef::new(OrderDetails::ProductId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderDetails::PriceAtSale)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderDetails::Quantity).integer().not_null())
                        .col(ColumnDef::new(OrderDetails::Status).string_len(20).not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_details_order_id")
                        .table(OrderDetails::Table)
                        .col(OrderDetails::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_details_product_id")
                        .table(OrderDetails::Table)
                        .col(OrderDetails::ProductId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderDetails::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Orders {
        Table,
        Id,
        CustomerId,
        TotalPrice,
        Status,
        Priority,
        CreatedAt,
        UpdatedAt,
        DeliveredAt,
    }

    #[derive(DeriveIden)]
    enum OrderDetails {
        Table,
        Id,
        OrderId,
        ProductId,
        PriceAtSale,
        Quantity,
        Status,
    }
}

mod m20240105_000005_create_wallet_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240105_000005_create_wallet_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Wallets::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Wallets::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Wallets::CustomerId)
                                .big_integer()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Wallets::Balance)
                                .decimal_len(10, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Wallets::UpdatedAt).timestamp().not_null())
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
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TransactionLogs::CustomerId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TransactionLogs::Amount)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TransactionLogs::TransactionType)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(ColumnDef::new(TransactionLogs::Description).string().null())
                        .col(
                            ColumnDef::new(TransactionLogs::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_transaction_logs_customer_id")
                        .table(TransactionLogs::Table)
                        .col(TransactionLogs::CustomerId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(TransactionLogs::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Wallets::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Wallets {
        Table,
        Id,
        CustomerId,
        Balance,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum TransactionLogs {
        Table,
        Id,
        CustomerId,
        Amount,
        TransactionType,
        Description,
        CreatedAt,
    }
}

mod m20240105_000006_create_stock_ledger_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240105_000006_create_stock_ledger_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockMovements::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::ProductId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::FromLocationId)
                                .big_integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::ToLocationId)
                                .big_integer()
                                .null(),
                        )
                        .col(ColumnDef::new(StockMovements::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(StockMovements::MovementType)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::StaffId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // Location-suggestion ranks candidates by movement traffic.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_movements_from_location")
                        .table(StockMovements::Table)
                        .col(StockMovements::FromLocationId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_movements_to_location")
                        .table(StockMovements::Table)
                        .col(StockMovements::ToLocationId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockAdjustments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockAdjustments::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAdjustments::ProductId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAdjustments::LocationId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAdjustments::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAdjustments::AdjustmentType)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockAdjustments::Reason).string().not_null())
                        .col(
                            ColumnDef::new(StockAdjustments::StaffId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAdjustments::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CycleCounts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CycleCounts::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CycleCounts::ProductId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CycleCounts::LocationId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CycleCounts::CountedQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CycleCounts::StaffId).big_integer().not_null())
                        .col(ColumnDef::new(CycleCounts::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(BarcodeScans::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BarcodeScans::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(BarcodeScans::StaffId).big_integer().not_null())
                        .col(
                            ColumnDef::new(BarcodeScans::ProductId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BarcodeScans::LocationId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(BarcodeScans::Action).string_len(20).not_null())
                        .col(
                            ColumnDef::new(BarcodeScans::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Activities::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Activities::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Activities::StaffId).big_integer().not_null())
                        .col(ColumnDef::new(Activities::Description).string().not_null())
                        .col(
                            ColumnDef::new(Activities::ActivityType)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Activities::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Activities::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(BarcodeScans::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(CycleCounts::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockAdjustments::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockMovements::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum StockMovements {
        Table,
        Id,
        ProductId,
        FromLocationId,
        ToLocationId,
        Quantity,
        MovementType,
        StaffId,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum StockAdjustments {
        Table,
        Id,
        ProductId,
        LocationId,
        Quantity,
        AdjustmentType,
        Reason,
        StaffId,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum CycleCounts {
        Table,
        Id,
        ProductId,
        LocationId,
        CountedQuantity,
        StaffId,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum BarcodeScans {
        Table,
        Id,
        StaffId,
        ProductId,
        LocationId,
        Action,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Activities {
        Table,
        Id,
        StaffId,
        Description,
        ActivityType,
        CreatedAt,
    }
}

mod m20240105_000007_create_delivery_and_misc_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240105_000007_create_delivery_and_misc_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ReplenishmentRequests::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ReplenishmentRequests::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReplenishmentRequests::ProductId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReplenishmentRequests::LocationId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReplenishmentRequests::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReplenishmentRequests::Status)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(ColumnDef::new(ReplenishmentRequests::Reason).string().null())
                        .col(
                            ColumnDef::new(ReplenishmentRequests::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DeliveryRecords::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DeliveryRecords::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryRecords::DeliveryCompany)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryRecords::CourierName)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryRecords::CourierPhone)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryRecords::AssignedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DeliveryRecordOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DeliveryRecordOrders::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryRecordOrders::DeliveryRecordId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryRecordOrders::OrderId)
                                .big_integer()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_delivery_record_orders_unique")
                        .table(DeliveryRecordOrders::Table)
                        .col(DeliveryRecordOrders::DeliveryRecordId)
                        .col(DeliveryRecordOrders::OrderId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Notifications::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Notifications::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Notifications::UserId).big_integer().not_null())
                        .col(ColumnDef::new(Notifications::Message).string().not_null())
                        .col(
                            ColumnDef::new(Notifications::Status)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Notifications::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_notifications_user_id")
                        .table(Notifications::Table)
                        .col(Notifications::UserId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Notifications::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(DeliveryRecordOrders::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(DeliveryRecords::Table).to_owned())
                .await?;
            manager
                .drop_table(
                    Table::drop()
                        .table(ReplenishmentRequests::Table)
                        .to_owned(),
                )
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ReplenishmentRequests {
        Table,
        Id,
        ProductId,
        LocationId,
        Quantity,
        Status,
        Reason,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum DeliveryRecords {
        Table,
        Id,
        DeliveryCompany,
        CourierName,
        CourierPhone,
        AssignedAt,
    }

    #[derive(DeriveIden)]
    enum DeliveryRecordOrders {
        Table,
        Id,
        DeliveryRecordId,
        OrderId,
    }

    #[derive(DeriveIden)]
    enum Notifications {
        Table,
        Id,
        UserId,
        Message,
        Status,
        CreatedAt,
    }
}
