//! Collection names and server constants.

/// Collection names in the MFlix database.
pub mod collections {
    /// Registered users, unique on `email`.
    pub const USERS: &str = "users";

    /// Login sessions, unique on `user_id`.
    pub const SESSIONS: &str = "sessions";

    /// The movie catalog queried by the lessons.
    pub const MOVIES: &str = "movies";
}

/// Server error code for a unique index violation.
pub const DUPLICATE_KEY_CODE: i32 = 11000;
