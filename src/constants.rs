pub mod limits {

    pub const MAX_BIO_LENGTH_IN_CHARS: usize = 250;

    pub const MAX_USERNAME_LENGTH: usize = 50;
}

pub mod takeout {

    pub const ARCHIVE_FILE_NAME: &str = "oppia_takeout_data.zip";

    pub const DATA_FILE_NAME: &str = "oppia_takeout_data.json";

    pub const IMAGES_PREFIX: &str = "images/";
}

/// Defaults applied to the email preference flags a new signup does not set
/// explicitly.
pub mod email_defaults {

    pub const EDITOR_ROLE: bool = true;

    pub const FEEDBACK_MESSAGE: bool = true;

    pub const SUBSCRIPTION: bool = true;
}
