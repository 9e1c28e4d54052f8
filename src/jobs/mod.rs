pub mod asset_refresh_sync;
