use super::Gate;
use super::identify;
use crate::lobby::Lobby;
use actix_cors::Cors;
use actix_web::App;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::HttpServer;
use actix_web::Responder;
use actix_web::middleware::Logger;
use actix_web::web;
use std::collections::HashMap;

pub struct Server;

impl Server {
    pub async fn run() -> Result<(), std::io::Error> {
        let gate = web::Data::new(Gate::new(Lobby::spawn()));
        log::info!("starting lobby server");
        HttpServer::new(move || {
            App::new()
                .wrap(Logger::new("%r %s %Ts"))
                .wrap(
                    Cors::default()
                        .allow_any_origin()
                        .allow_any_method()
                        .allow_any_header(),
                )
                .app_data(gate.clone())
                .route("/ws", web::get().to(connect))
        })
        .workers(4)
        .bind(std::env::var("BIND_ADDR").expect("BIND_ADDR must be set"))?
        .run()
        .await
    }
}

async fn connect(
    gate: web::Data<Gate>,
    query: web::Query<HashMap<String, String>>,
    body: web::Payload,
    req: HttpRequest,
) -> impl Responder {
    let Some(name) = identify(&query) else {
        return HttpResponse::BadRequest()
            .body("missing or invalid user")
            .map_into_right_body();
    };
    match actix_ws::handle(&req, body) {
        Ok((response, session, stream)) => {
            gate.bridge(name, session, stream);
            response.map_into_left_body()
        }
        Err(e) => HttpResponse::InternalServerError()
            .body(e.to_string())
            .map_into_right_body(),
    }
}
