use mongodb::bson::{doc, Document};
use mongodb::error::Error;
use mongodb::options::IndexOptions;
use mongodb::{options::ClientOptions, Client, Database, IndexModel};

use crate::store::mongo::{ALLOCATIONS, REQUESTS, USERS};

pub async fn init_db(uri: &str) -> Result<Client, Error> {
    let mut client_options = ClientOptions::parse(uri).await?;
    client_options.app_name = Some("TutorMatch".to_string());
    Client::with_options(client_options)
}

/// Creates the unique indexes behind the uniqueness rules:
/// one account per `(email, type)`, one active allocation per pair,
/// one pending request per pair. Safe to run on every startup.
pub async fn ensure_indexes(db: &Database) -> Result<(), Error> {
    let unique = |keys: Document, partial: Option<Document>| {
        IndexModel::builder()
            .keys(keys)
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .partial_filter_expression(partial)
                    .build(),
            )
            .build()
    };

    db.collection::<Document>(USERS)
        .create_index(unique(doc! { "email": 1, "type": 1 }, None), None)
        .await?;
    db.collection::<Document>(ALLOCATIONS)
        .create_index(
            unique(
                doc! { "studentId": 1, "teacherId": 1 },
                Some(doc! { "status": "active" }),
            ),
            None,
        )
        .await?;
    db.collection::<Document>(REQUESTS)
        .create_index(
            unique(
                doc! { "requesterId": 1, "targetId": 1 },
                Some(doc! { "status": "pending" }),
            ),
            None,
        )
        .await?;

    log::info!("MongoDB indexes ensured on {}", db.name());
    Ok(())
}
