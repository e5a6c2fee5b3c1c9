use anyhow::{Result, bail};
use clap::Subcommand;
use comfy_table::Cell;
use serde_json::json;

use super::ui;
use crate::api::ApiClient;
use crate::core::model::User;

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// List all users
    List,
    /// Show the logged-in user
    Me,
    /// Update a user's profile
    Update {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        age: Option<u32>,
        #[arg(long)]
        place: Option<String>,
    },
    /// Delete a user; refused while accounts still reference them
    Delete { id: u64 },
}

pub async fn run(client: &ApiClient, command: UserCommand) -> Result<()> {
    match command {
        UserCommand::List => {
            let users = client.list_users().await?;
            print_users(&users);
        }
        UserCommand::Me => {
            let user = client.me().await?;
            print_users(std::slice::from_ref(&user));
        }
        UserCommand::Update {
            id,
            name,
            age,
            place,
        } => {
            let mut fields = json!({});
            if let Some(name) = name {
                fields["name"] = json!(name);
            }
            if let Some(age) = age {
                fields["age"] = json!(age);
            }
            if let Some(place) = place {
                fields["place"] = json!(place);
            }
            client.update_user(id, fields).await?;
            println!("User updated.");
        }
        UserCommand::Delete { id } => {
            let check = client.can_delete_user(id).await?;
            if !check.can_delete {
                bail!(
                    "{}",
                    check
                        .reason
                        .unwrap_or_else(|| "User cannot be deleted.".to_string())
                );
            }
            client.delete_user(id).await?;
            println!("User deleted.");
        }
    }
    Ok(())
}

fn print_users(users: &[User]) {
    if users.is_empty() {
        println!("No users.");
        return;
    }
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Id"),
        ui::header_cell("Name"),
        ui::header_cell("Age"),
        ui::header_cell("Place"),
    ]);
    for user in users {
        table.add_row(vec![
            Cell::new(user.id),
            Cell::new(&user.name),
            ui::format_optional_cell(user.age, |a| a.to_string()),
            Cell::new(user.place.as_deref().unwrap_or("-")),
        ]);
    }
    println!("{table}");
}
