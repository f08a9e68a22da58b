use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/plants", plant_routes(config))
        .nest("/images", image_routes(config))
        .nest("/inventory", inventory_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::me))
}

fn plant_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let crud = OpenApiRouter::new()
        .routes(routes!(
            handlers::plant::list_plants,
            handlers::plant::create_plant
        ))
        .routes(routes!(
            handlers::plant::get_plant,
            handlers::plant::replace_plant,
            handlers::plant::update_plant,
            handlers::plant::delete_plant
        ))
        .routes(routes!(handlers::inventory::use_as_template))
        .routes(routes!(
            handlers::image::attach_image,
            handlers::image::detach_image
        ));

    let csv = OpenApiRouter::new()
        .routes(routes!(handlers::import::upload_csv))
        .layer(handlers::import::csv_upload_body_limit());

    let main_image = OpenApiRouter::new()
        .routes(routes!(handlers::image::set_main_image))
        .layer(handlers::image::image_upload_body_limit(
            config.media.max_upload_size,
        ));

    crud.merge(csv).merge(main_image)
}

fn image_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let crud = OpenApiRouter::new().routes(routes!(
        handlers::image::update_image,
        handlers::image::delete_image
    ));

    let upload = OpenApiRouter::new()
        .routes(routes!(
            handlers::image::list_images,
            handlers::image::upload_image
        ))
        .layer(handlers::image::image_upload_body_limit(
            config.media.max_upload_size,
        ));

    crud.merge(upload)
}

fn inventory_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::inventory::list_inventory,
            handlers::inventory::create_inventory
        ))
        .routes(routes!(
            handlers::inventory::get_inventory,
            handlers::inventory::replace_inventory,
            handlers::inventory::update_inventory,
            handlers::inventory::delete_inventory
        ))
}
