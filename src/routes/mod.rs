pub mod admin;
pub mod api;
pub mod login;
pub mod main;
pub mod sync;

pub use admin::{
    admin_dashboard, admin_sync_drive, admin_sync_youtube, create_news, create_sermon,
    create_user, get_members, members_page, update_member_role,
};
pub use api::{get_news, get_sermons};
pub use login::{change_password, get_login, logout, post_login};
pub use main::{home, news_page, sermons_page};
pub use sync::{sync_drive_endpoint, sync_youtube_endpoint};
