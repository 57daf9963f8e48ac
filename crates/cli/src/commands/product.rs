use clap::{ArgAction, Subcommand};
use serde_json::Value;
use tracing::debug;

use crate::commands::CommandResult;
use catalog_core::config::{AppConfig, LoadOptions};
use catalog_core::domain::product::{NewProduct, ProductId, ProductPatch};
use catalog_core::errors::{ApplicationError, DomainError};
use catalog_core::query::{ListQuery, PageRequest, Visibility};
use catalog_core::validation;
use catalog_db::{open_catalog, ProductRepository};

#[derive(Debug, Subcommand)]
pub enum ProductCommand {
    #[command(about = "Append a product to the catalog")]
    Create {
        #[arg(long, help = "Caller-chosen product id")]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        active: bool,
        #[arg(long, help = "Reference to an already stored image, e.g. /images/<file>")]
        image_path: Option<String>,
    },
    #[command(about = "Fetch one product by id")]
    Get { id: String },
    #[command(about = "List one page of active products")]
    List {
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        page: i64,
        #[arg(long, help = "Include inactive products")]
        all: bool,
    },
    #[command(about = "Overwrite the given fields of a product")]
    Update {
        id: String,
        #[arg(long)]
        new_id: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, action = ArgAction::Set)]
        active: Option<bool>,
        #[arg(long)]
        image_path: Option<String>,
    },
    #[command(about = "Remove a product and print it")]
    Delete { id: String },
}

impl ProductCommand {
    fn name(&self) -> &'static str {
        match self {
            Self::Create { .. } => "product.create",
            Self::Get { .. } => "product.get",
            Self::List { .. } => "product.list",
            Self::Update { .. } => "product.update",
            Self::Delete { .. } => "product.delete",
        }
    }
}

pub fn run(command: ProductCommand) -> CommandResult {
    let name = command.name();
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                name,
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                name,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    debug!(
        event_name = "catalog.cli.product",
        command = name,
        catalog_path = %config.storage.catalog_path.display(),
        "running product command"
    );

    match runtime.block_on(execute(&config, command)) {
        Ok((message, data)) => CommandResult::success_with_data(name, message, Some(data)),
        Err(error) => {
            let (error_class, exit_code) = classify(&error);
            let interface = error.into_interface(format!("cli-{}", std::process::id()));
            CommandResult::failure(name, error_class, interface.to_string(), exit_code)
        }
    }
}

async fn execute(
    config: &AppConfig,
    command: ProductCommand,
) -> Result<(String, Value), ApplicationError> {
    let repo = open_catalog(config);

    match command {
        ProductCommand::Create { id, name, description, active, image_path } => {
            let product = NewProduct {
                product_id: ProductId(id),
                product_name: name,
                product_description: description,
                is_active: active.into(),
            };
            validation::validate_new_product(&product)?;
            let created = repo.create(product, image_path).await?;
            Ok((format!("created product `{}`", created.product_id), to_value(&created)?))
        }
        ProductCommand::Get { id } => {
            let product = repo.get(&ProductId(id)).await?;
            Ok((format!("found product `{}`", product.product_id), to_value(&product)?))
        }
        ProductCommand::List { page, all } => {
            let visibility = if all { Visibility::All } else { Visibility::ActiveOnly };
            let query =
                ListQuery { page: PageRequest::new(page, config.catalog.page_size), visibility };
            let products = repo.list(query).await?;
            Ok((
                format!("page {} holds {} product(s)", query.page.page(), products.len()),
                to_value(&products)?,
            ))
        }
        ProductCommand::Update { id, new_id, name, description, active, image_path } => {
            let patch = ProductPatch {
                product_id: new_id.map(ProductId),
                product_name: name,
                product_description: description,
                is_active: active.map(Into::into),
                image_path,
                ..ProductPatch::default()
            };
            validation::validate_patch(&patch)?;
            let updated = repo.update(&ProductId(id), patch).await?;
            Ok((format!("updated product `{}`", updated.product_id), to_value(&updated)?))
        }
        ProductCommand::Delete { id } => {
            let removed = repo.delete(&ProductId(id)).await?;
            Ok((format!("deleted product `{}`", removed.product_id), to_value(&removed)?))
        }
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, ApplicationError> {
    serde_json::to_value(value).map_err(|error| {
        ApplicationError::Domain(DomainError::InvariantViolation(format!(
            "response could not be serialized: {error}"
        )))
    })
}

fn classify(error: &ApplicationError) -> (&'static str, u8) {
    match error {
        ApplicationError::Configuration(_) => ("config_validation", 2),
        ApplicationError::Domain(_) => ("validation", 4),
        ApplicationError::NotFound(_) => ("not_found", 5),
        ApplicationError::AlreadyExists(_) => ("already_exists", 6),
        ApplicationError::Persistence(_) => ("storage_unavailable", 7),
        ApplicationError::CorruptData(_) => ("corrupt_data", 8),
    }
}
