use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_organisations_and_contacts::Migration),
            Box::new(m20240101_000002_create_locations_table::Migration),
            Box::new(m20240101_000003_create_equipment_data_table::Migration),
            Box::new(m20240101_000004_create_offers_tables::Migration),
            Box::new(m20240101_000005_create_requests_tables::Migration),
            Box::new(m20240101_000006_create_shipments_table::Migration),
            Box::new(m20240101_000007_create_shipment_items_table::Migration),
            Box::new(m20240101_000008_create_claims_table::Migration),
            Box::new(m20240101_000009_create_changes_table::Migration),
            Box::new(m20240101_000010_default_locations::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_organisations_and_contacts {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_organisations_and_contacts"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Organisations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Organisations::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Organisations::Name).string().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Contacts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Contacts::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Contacts::FirstName).string().not_null())
                        .col(ColumnDef::new(Contacts::LastName).string().not_null())
                        .col(
                            ColumnDef::new(Contacts::Email)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Contacts::Phone).string().null())
                        .col(ColumnDef::new(Contacts::OrganisationId).integer().null())
                        .col(ColumnDef::new(Contacts::PasswordHash).string().not_null())
                        .col(
                            ColumnDef::new(Contacts::IsSuperuser)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Contacts::IsDonor)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Contacts::IsRequester)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Contacts::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Contacts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Contacts::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_contacts_organisation_id")
                        .table(Contacts::Table)
                        .col(Contacts::OrganisationId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Contacts::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Organisations::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Organisations {
        Table,
        Id,
        Name,
    }

    #[derive(Iden)]
    enum Contacts {
        Table,
        Id,
        FirstName,
        LastName,
        Email,
        Phone,
        OrganisationId,
        PasswordHash,
        IsSuperuser,
        IsDonor,
        IsRequester,
        Active,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_locations_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_locations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Locations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Locations::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Locations::Name).string().not_null())
                        .col(ColumnDef::new(Locations::City).string().null())
                        .col(ColumnDef::new(Locations::Country).string().null())
                        .col(ColumnDef::new(Locations::Email).string().null())
                        .col(ColumnDef::new(Locations::Phone).string().null())
                        .col(
                            ColumnDef::new(Locations::Kind)
                                .string()
                                .not_null()
                                .default("other"),
                        )
                        .col(ColumnDef::new(Locations::ManagedBy).integer().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_locations_country")
                        .table(Locations::Table)
                        .col(Locations::Country)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Locations::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Locations {
        Table,
        Id,
        Name,
        City,
        Country,
        Email,
        Phone,
        Kind,
        ManagedBy,
    }
}

mod m20240101_000003_create_equipment_data_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_equipment_data_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(EquipmentData::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(EquipmentData::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(EquipmentData::Brand).string().not_null())
                        .col(ColumnDef::new(EquipmentData::Model).string().not_null())
                        .col(
                            ColumnDef::new(EquipmentData::Width)
                                .decimal_len(10, 2)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(EquipmentData::Height)
                                .decimal_len(10, 2)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(EquipmentData::Depth)
                                .decimal_len(10, 2)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(EquipmentData::Weight)
                                .decimal_len(10, 2)
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            // brand+model is the import key
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_equipment_data_brand_model")
                        .table(EquipmentData::Table)
                        .col(EquipmentData::Brand)
                        .col(EquipmentData::Model)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(EquipmentData::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum EquipmentData {
        Table,
        Id,
        Brand,
        Model,
        Width,
        Height,
        Depth,
        Weight,
    }
}

mod m20240101_000004_create_offers_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_offers_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Offers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Offers::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Offers::ContactId).integer().not_null())
                        .col(ColumnDef::new(Offers::Description).string().not_null())
                        .col(ColumnDef::new(Offers::LocationId).integer().null())
                        .col(ColumnDef::new(Offers::DeliveryMethod).string().null())
                        .col(ColumnDef::new(Offers::InternalNotes).string().null())
                        .col(
                            ColumnDef::new(Offers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Offers::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OfferItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OfferItems::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OfferItems::OfferId).integer().not_null())
                        .col(
                            ColumnDef::new(OfferItems::ItemType)
                                .string()
                                .not_null()
                                .default("other"),
                        )
                        .col(ColumnDef::new(OfferItems::Brand).string().not_null())
                        .col(ColumnDef::new(OfferItems::Model).string().not_null())
                        .col(ColumnDef::new(OfferItems::Amount).integer().not_null())
                        .col(ColumnDef::new(OfferItems::Notes).string().null())
                        .col(
                            ColumnDef::new(OfferItems::Received)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(OfferItems::Rejected)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(OfferItems::ClaimedBy).integer().null())
                        .col(
                            ColumnDef::new(OfferItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OfferItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_offer_items_offer_id")
                        .table(OfferItems::Table)
                        .col(OfferItems::OfferId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_offer_items_brand_model")
                        .table(OfferItems::Table)
                        .col(OfferItems::Brand)
                        .col(OfferItems::Model)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OfferItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Offers::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Offers {
        Table,
        Id,
        ContactId,
        Description,
        LocationId,
        DeliveryMethod,
        InternalNotes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum OfferItems {
        Table,
        Id,
        OfferId,
        ItemType,
        Brand,
        Model,
        Amount,
        Notes,
        Received,
        Rejected,
        ClaimedBy,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000005_create_requests_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_requests_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Requests::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Requests::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Requests::ContactId).integer().not_null())
                        .col(ColumnDef::new(Requests::Goal).string().not_null())
                        .col(ColumnDef::new(Requests::Description).string().null())
                        .col(ColumnDef::new(Requests::InternalNotes).string().null())
                        .col(
                            ColumnDef::new(Requests::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Requests::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(RequestItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RequestItems::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(RequestItems::RequestId).integer().not_null())
                        .col(
                            ColumnDef::new(RequestItems::ItemType)
                                .string()
                                .not_null()
                                .default("other"),
                        )
                        .col(ColumnDef::new(RequestItems::Brand).string().not_null())
                        .col(ColumnDef::new(RequestItems::Model).string().not_null())
                        .col(ColumnDef::new(RequestItems::Amount).integer().not_null())
                        .col(
                            ColumnDef::new(RequestItems::UpTo)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(RequestItems::Notes).string().null())
                        .col(
                            ColumnDef::new(RequestItems::AlternativeFor)
                                .integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(RequestItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RequestItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_request_items_request_id")
                        .table(RequestItems::Table)
                        .col(RequestItems::RequestId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(RequestItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Requests::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Requests {
        Table,
        Id,
        ContactId,
        Goal,
        Description,
        InternalNotes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum RequestItems {
        Table,
        Id,
        RequestId,
        ItemType,
        Brand,
        Model,
        Amount,
        UpTo,
        Notes,
        AlternativeFor,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000006_create_shipments_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_shipments_table"
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
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Shipments::Name).string().not_null())
                        .col(ColumnDef::new(Shipments::ShipmentDate).date().null())
                        .col(ColumnDef::new(Shipments::DeliveryDate).date().null())
                        .col(
                            ColumnDef::new(Shipments::FromLocationId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Shipments::ToLocationId).integer().not_null())
                        .col(
                            ColumnDef::new(Shipments::IsDelivered)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Shipments::Notes).string().null())
                        .col(
                            ColumnDef::new(Shipments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_shipments_from_location")
                        .table(Shipments::Table)
                        .col(Shipments::FromLocationId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Shipments::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Shipments {
        Table,
        Id,
        Name,
        ShipmentDate,
        DeliveryDate,
        FromLocationId,
        ToLocationId,
        IsDelivered,
        Notes,
        CreatedAt,
    }
}

mod m20240101_000007_create_shipment_items_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000007_create_shipment_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ShipmentItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ShipmentItems::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ShipmentItems::ShipmentId).integer().null())
                        .col(
                            ColumnDef::new(ShipmentItems::OfferedItemId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ShipmentItems::Amount).integer().not_null())
                        .col(
                            ColumnDef::new(ShipmentItems::LastLocationId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ShipmentItems::ParentShipmentItem)
                                .integer()
                                .null(),
                        )
                        .col(ColumnDef::new(ShipmentItems::When).date().null())
                        .col(
                            ColumnDef::new(ShipmentItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_shipment_items_offered_item")
                        .table(ShipmentItems::Table)
                        .col(ShipmentItems::OfferedItemId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_shipment_items_parent")
                        .table(ShipmentItems::Table)
                        .col(ShipmentItems::ParentShipmentItem)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_shipment_items_shipment")
                        .table(ShipmentItems::Table)
                        .col(ShipmentItems::ShipmentId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ShipmentItems::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum ShipmentItems {
        Table,
        Id,
        ShipmentId,
        OfferedItemId,
        Amount,
        LastLocationId,
        ParentShipmentItem,
        When,
        CreatedAt,
    }
}

mod m20240101_000008_create_claims_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000008_create_claims_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Claims::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Claims::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Claims::RequestedItemId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Claims::OfferedItemId).integer().not_null())
                        .col(ColumnDef::new(Claims::Amount).integer().not_null())
                        .col(ColumnDef::new(Claims::ShipmentId).integer().null())
                        .col(
                            ColumnDef::new(Claims::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_claims_offered_item")
                        .table(Claims::Table)
                        .col(Claims::OfferedItemId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_claims_requested_item")
                        .table(Claims::Table)
                        .col(Claims::RequestedItemId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Claims::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Claims {
        Table,
        Id,
        RequestedItemId,
        OfferedItemId,
        Amount,
        ShipmentId,
        CreatedAt,
    }
}

mod m20240101_000009_create_changes_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000009_create_changes_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Changes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Changes::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Changes::Who).integer().not_null())
                        .col(ColumnDef::new(Changes::Action).string().not_null())
                        .col(ColumnDef::new(Changes::ChangeType).string().not_null())
                        .col(ColumnDef::new(Changes::What).string().not_null())
                        .col(ColumnDef::new(Changes::Before).text().not_null())
                        .col(ColumnDef::new(Changes::After).text().not_null())
                        .col(
                            ColumnDef::new(Changes::When)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_changes_when")
                        .table(Changes::Table)
                        .col(Changes::When)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Changes::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Changes {
        Table,
        Id,
        Who,
        Action,
        ChangeType,
        What,
        Before,
        After,
        When,
    }
}

mod m20240101_000010_default_locations {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000010_default_locations"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Well-known endpoints every deployment starts with.
            let insert = Query::insert()
                .into_table(Locations::Table)
                .columns([Locations::Name, Locations::Kind])
                .values_panic(["Donor".into(), "donor_site".into()])
                .values_panic(["Requester".into(), "requester_site".into()])
                .to_owned();

            manager.exec_stmt(insert).await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            let delete = Query::delete()
                .from_table(Locations::Table)
                .cond_where(
                    Expr::col(Locations::Name)
                        .is_in(["Donor", "Requester"]),
                )
                .to_owned();

            manager.exec_stmt(delete).await
        }
    }

    #[derive(Iden)]
    enum Locations {
        Table,
        Name,
        Kind,
    }
}
