use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create tables in order of dependencies
        self.create_users_table(manager).await?;
        self.create_connections_table(manager).await?;
        self.create_categories_table(manager).await?;
        self.create_live_streams_table(manager).await?;
        self.create_vod_streams_table(manager).await?;
        self.create_series_table(manager).await?;

        // Create indexes
        self.create_indexes(manager).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order
        manager
            .drop_table(Table::drop().table(Series::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(VodStreams::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LiveStreams::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(XtreamConnections::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

impl Migration {
    async fn create_users_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Users::Username)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::Email).string_len(255))
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_connections_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(XtreamConnections::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(XtreamConnections::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(XtreamConnections::ServerUrl)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(XtreamConnections::Username)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(XtreamConnections::Password)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(XtreamConnections::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(XtreamConnections::UserInfo).text())
                    .col(ColumnDef::new(XtreamConnections::ServerInfo).text())
                    .col(
                        ColumnDef::new(XtreamConnections::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(XtreamConnections::LastUsed)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(XtreamConnections::LastSyncedAt)
                            .timestamp_with_time_zone(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_categories_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Categories::ConnectionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Categories::CategoryId)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Categories::CategoryName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Categories::ParentId).big_integer())
                    .col(
                        ColumnDef::new(Categories::StreamType)
                            .string_len(50)
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_categories_connection")
                            .from(Categories::Table, Categories::ConnectionId)
                            .to(XtreamConnections::Table, XtreamConnections::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_live_streams_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LiveStreams::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LiveStreams::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LiveStreams::ConnectionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LiveStreams::StreamId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LiveStreams::Name).string_len(255).not_null())
                    .col(ColumnDef::new(LiveStreams::StreamIcon).string_len(500))
                    .col(ColumnDef::new(LiveStreams::CategoryId).string_len(50))
                    .col(ColumnDef::new(LiveStreams::EpgChannelId).string_len(100))
                    .col(ColumnDef::new(LiveStreams::Added).string_len(50))
                    .col(ColumnDef::new(LiveStreams::IsAdult).string_len(10))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_live_streams_connection")
                            .from(LiveStreams::Table, LiveStreams::ConnectionId)
                            .to(XtreamConnections::Table, XtreamConnections::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_vod_streams_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VodStreams::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VodStreams::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(VodStreams::ConnectionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VodStreams::StreamId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(VodStreams::Name).string_len(255).not_null())
                    .col(ColumnDef::new(VodStreams::StreamIcon).string_len(500))
                    .col(ColumnDef::new(VodStreams::CategoryId).string_len(50))
                    .col(ColumnDef::new(VodStreams::Added).string_len(50))
                    .col(ColumnDef::new(VodStreams::ContainerExtension).string_len(20))
                    .col(ColumnDef::new(VodStreams::Rating).string_len(20))
                    .col(ColumnDef::new(VodStreams::Rating5based).double())
                    .col(ColumnDef::new(VodStreams::Year).string_len(20))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vod_streams_connection")
                            .from(VodStreams::Table, VodStreams::ConnectionId)
                            .to(XtreamConnections::Table, XtreamConnections::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_series_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Series::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Series::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Series::ConnectionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Series::SeriesId).big_integer().not_null())
                    .col(ColumnDef::new(Series::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Series::Cover).string_len(500))
                    .col(ColumnDef::new(Series::Plot).text())
                    .col(ColumnDef::new(Series::Cast).string_len(500))
                    .col(ColumnDef::new(Series::Director).string_len(255))
                    .col(ColumnDef::new(Series::Genre).string_len(255))
                    .col(ColumnDef::new(Series::ReleaseDate).string_len(50))
                    .col(ColumnDef::new(Series::LastModified).string_len(50))
                    .col(ColumnDef::new(Series::Rating).string_len(20))
                    .col(ColumnDef::new(Series::Rating5based).double())
                    .col(ColumnDef::new(Series::BackdropPath).text())
                    .col(ColumnDef::new(Series::YoutubeTrailer).string_len(255))
                    .col(ColumnDef::new(Series::EpisodeRunTime).string_len(20))
                    .col(ColumnDef::new(Series::CategoryId).string_len(50))
                    .col(ColumnDef::new(Series::Year).string_len(20))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_series_connection")
                            .from(Series::Table, Series::ConnectionId)
                            .to(XtreamConnections::Table, XtreamConnections::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_indexes(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_categories_connection_type")
                    .table(Categories::Table)
                    .col(Categories::ConnectionId)
                    .col(Categories::StreamType)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_live_streams_connection_category")
                    .table(LiveStreams::Table)
                    .col(LiveStreams::ConnectionId)
                    .col(LiveStreams::CategoryId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_vod_streams_connection_category")
                    .table(VodStreams::Table)
                    .col(VodStreams::ConnectionId)
                    .col(VodStreams::CategoryId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_series_connection_category")
                    .table(Series::Table)
                    .col(Series::ConnectionId)
                    .col(Series::CategoryId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    CreatedAt,
}

#[derive(DeriveIden)]
enum XtreamConnections {
    Table,
    Id,
    ServerUrl,
    Username,
    Password,
    IsActive,
    UserInfo,
    ServerInfo,
    CreatedAt,
    LastUsed,
    LastSyncedAt,
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    ConnectionId,
    CategoryId,
    CategoryName,
    ParentId,
    StreamType,
}

#[derive(DeriveIden)]
enum LiveStreams {
    Table,
    Id,
    ConnectionId,
    StreamId,
    Name,
    StreamIcon,
    CategoryId,
    EpgChannelId,
    Added,
    IsAdult,
}

#[derive(DeriveIden)]
enum VodStreams {
    Table,
    Id,
    ConnectionId,
    StreamId,
    Name,
    StreamIcon,
    CategoryId,
    Added,
    ContainerExtension,
    Rating,
    #[sea_orm(iden = "rating_5based")]
    Rating5based,
    Year,
}

#[derive(DeriveIden)]
enum Series {
    Table,
    Id,
    ConnectionId,
    SeriesId,
    Name,
    Cover,
    Plot,
    Cast,
    Director,
    Genre,
    ReleaseDate,
    LastModified,
    Rating,
    #[sea_orm(iden = "rating_5based")]
    Rating5based,
    BackdropPath,
    YoutubeTrailer,
    EpisodeRunTime,
    CategoryId,
    Year,
}
