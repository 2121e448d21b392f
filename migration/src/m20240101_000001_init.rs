use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ========== USERS ==========
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Users::Username)
                            .string_len(150)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Users::ApiToken)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Users::IsStaff)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ========== SESSIONS ==========
        // Written by the login layer, only read here
        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sessions::SessionKey)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Sessions::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(Sessions::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sessions_user")
                            .from(Sessions::Table, Sessions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ========== PLANTS ==========
        manager
            .create_table(
                Table::create()
                    .table(Plants::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Plants::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Plants::Name).string_len(50).not_null())
                    .col(ColumnDef::new(Plants::City).string_len(30).not_null())
                    .col(
                        ColumnDef::new(Plants::Address)
                            .string_len(100)
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Plants::OwnerId).uuid().not_null())
                    .col(
                        ColumnDef::new(Plants::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_plants_owner")
                            .from(Plants::Table, Plants::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_plants_owner")
                    .table(Plants::Table)
                    .col(Plants::OwnerId)
                    .to_owned(),
            )
            .await?;

        // ========== SENSOR TYPES / BRANDS ==========
        manager
            .create_table(
                Table::create()
                    .table(SensorTypes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SensorTypes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SensorTypes::Name)
                            .string_len(30)
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SensorBrands::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SensorBrands::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SensorBrands::Name)
                            .string_len(30)
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        // ========== SENSORS ==========
        // Primary key is the physical device code
        manager
            .create_table(
                Table::create()
                    .table(Sensors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sensors::Id)
                            .string_len(30)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Sensors::TypeId).integer().not_null())
                    .col(ColumnDef::new(Sensors::BrandId).integer().not_null())
                    .col(ColumnDef::new(Sensors::FaultCode).string_len(30).not_null())
                    .col(
                        ColumnDef::new(Sensors::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sensors_type")
                            .from(Sensors::Table, Sensors::TypeId)
                            .to(SensorTypes::Table, SensorTypes::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sensors_brand")
                            .from(Sensors::Table, Sensors::BrandId)
                            .to(SensorBrands::Table, SensorBrands::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // ========== INSTALLATIONS ==========
        manager
            .create_table(
                Table::create()
                    .table(Installations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Installations::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Installations::PlantId).uuid().not_null())
                    .col(
                        ColumnDef::new(Installations::SensorId)
                            .string_len(30)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Installations::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Installations::EndedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_installations_plant")
                            .from(Installations::Table, Installations::PlantId)
                            .to(Plants::Table, Plants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_installations_sensor")
                            .from(Installations::Table, Installations::SensorId)
                            .to(Sensors::Table, Sensors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_installations_plant_ended")
                    .table(Installations::Table)
                    .col(Installations::PlantId)
                    .col(Installations::EndedAt)
                    .to_owned(),
            )
            .await?;

        // At most one open installation per sensor (partial index, raw SQL)
        let db = manager.get_connection();
        db.execute_unprepared(
            "CREATE UNIQUE INDEX idx_installations_open_sensor ON installations (sensor_id) WHERE ended_at IS NULL",
        )
        .await?;

        // ========== RAW STRINGS ==========
        manager
            .create_table(
                Table::create()
                    .table(RawStrings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RawStrings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RawStrings::Payload).string_len(200).not_null())
                    .col(
                        ColumnDef::new(RawStrings::ReceivedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ========== READINGS ==========
        manager
            .create_table(
                Table::create()
                    .table(Readings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Readings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Readings::RawStringId)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Readings::SensorId).string_len(30).not_null())
                    .col(
                        ColumnDef::new(Readings::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Readings::Value).big_integer().not_null())
                    .col(ColumnDef::new(Readings::Message).string_len(255))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_readings_raw_string")
                            .from(Readings::Table, Readings::RawStringId)
                            .to(RawStrings::Table, RawStrings::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_readings_sensor")
                            .from(Readings::Table, Readings::SensorId)
                            .to(Sensors::Table, Sensors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_readings_sensor_recorded")
                    .table(Readings::Table)
                    .col(Readings::SensorId)
                    .col(Readings::RecordedAt)
                    .to_owned(),
            )
            .await?;

        // ========== FAULTS ==========
        manager
            .create_table(
                Table::create()
                    .table(Faults::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Faults::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Faults::RawStringId)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Faults::SensorId).string_len(30).not_null())
                    .col(ColumnDef::new(Faults::Message).string_len(255))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_faults_raw_string")
                            .from(Faults::Table, Faults::RawStringId)
                            .to(RawStrings::Table, RawStrings::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_faults_sensor")
                            .from(Faults::Table, Faults::SensorId)
                            .to(Sensors::Table, Sensors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_faults_sensor")
                    .table(Faults::Table)
                    .col(Faults::SensorId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Faults::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Readings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RawStrings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Installations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sensors::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SensorBrands::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SensorTypes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Plants::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sessions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    PasswordHash,
    ApiToken,
    IsStaff,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Sessions {
    Table,
    SessionKey,
    UserId,
    ExpiresAt,
}

#[derive(DeriveIden)]
enum Plants {
    Table,
    Id,
    Name,
    City,
    Address,
    OwnerId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum SensorTypes {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum SensorBrands {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Sensors {
    Table,
    Id,
    TypeId,
    BrandId,
    FaultCode,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Installations {
    Table,
    Id,
    PlantId,
    SensorId,
    StartedAt,
    EndedAt,
}

#[derive(DeriveIden)]
enum RawStrings {
    Table,
    Id,
    Payload,
    ReceivedAt,
}

#[derive(DeriveIden)]
enum Readings {
    Table,
    Id,
    RawStringId,
    SensorId,
    RecordedAt,
    Value,
    Message,
}

#[derive(DeriveIden)]
enum Faults {
    Table,
    Id,
    RawStringId,
    SensorId,
    Message,
}
