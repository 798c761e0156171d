pub mod user_settings;

pub mod prelude {
    pub use super::user_settings::Entity as UserSettings;
}
