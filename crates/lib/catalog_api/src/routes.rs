//! Route paths.

pub const POST_AUTH_LOGIN: &str = "/api/v1/auth/login";
pub const POST_AUTH_REGISTER: &str = "/api/v1/auth/register";
pub const POST_AUTH_REFRESH: &str = "/api/v1/auth/refresh";
pub const POST_AUTH_LOGOUT: &str = "/api/v1/auth/logout";
pub const GET_AUTH_ME: &str = "/api/v1/auth/me";
pub const DELETE_ADMIN_USER_REFRESH_TOKEN: &str = "/api/v1/admin/users/{userId}/refresh-token";
