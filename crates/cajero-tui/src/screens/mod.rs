//! Screen implementations. Each screen is a top-level Component.

pub mod atm;
pub mod auth;
pub mod dashboard;
pub mod home;

use cajero_core::Bank;

use crate::component::Component;
use crate::screen::ScreenId;

/// Create every screen, each holding its own handle on the bank.
pub fn create_screens(bank: &Bank, profile_name: &str) -> Vec<(ScreenId, Box<dyn Component>)> {
    vec![
        (ScreenId::Home, Box::new(home::HomeScreen::new())),
        (
            ScreenId::Auth,
            Box::new(auth::AuthScreen::new(bank.clone(), profile_name)),
        ),
        (
            ScreenId::Dashboard,
            Box::new(dashboard::DashboardScreen::new(bank.clone())),
        ),
        (ScreenId::Atm, Box::new(atm::AtmScreen::new(bank.clone()))),
    ]
}
