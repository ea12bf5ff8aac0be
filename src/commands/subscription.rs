use super::{build_app, CommandError};
use crate::{
    cli::SubscriptionAction,
    config::Config,
    database::models::subscription,
    destinations::{list_subscriptions, subscribe, unsubscribe},
};

pub async fn handle_subscription_command(
    config: Config,
    action: SubscriptionAction,
) -> Result<(), CommandError> {
    let app = build_app(config).await?;

    match action {
        SubscriptionAction::Add {
            user_id,
            job_type,
            locations,
            companies,
            roles,
        } => {
            let created =
                subscribe(&app, &user_id, job_type, &locations, &companies, &roles).await?;
            println!("✅ Subscribed");
            print_subscription(1, &created);
        }
        SubscriptionAction::List { user_id } => {
            let subscriptions = list_subscriptions(&app, &user_id).await?;
            if subscriptions.is_empty() {
                println!("No subscriptions for user {user_id}");
            }
            for (index, subscription) in subscriptions.iter().enumerate() {
                print_subscription(index + 1, subscription);
            }
        }
        SubscriptionAction::Remove { user_id, position } => {
            unsubscribe(&app, &user_id, position).await?;
            println!("✅ Removed subscription {position}");
        }
    }

    Ok(())
}

fn print_subscription(position: usize, subscription: &subscription::Model) {
    println!("{position}. {} jobs", subscription.job_type);
    println!("   Locations: {}", subscription.locations);
    println!("   Companies: {}", subscription.companies);
    println!("   Roles: {}", subscription.roles);
}
