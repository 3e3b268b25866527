use actix_web::{post, web, App, HttpResponse, HttpServer, Responder};
use anyhow::Context;
use clap::{Arg, Command};
use kube::core::admission::{AdmissionRequest as ReviewRequest, AdmissionResponse, AdmissionReview};
use kube::core::DynamicObject;
use openssl::ssl::{SslAcceptor, SslAcceptorBuilder, SslFiletype, SslMethod};
use webhook_advancedcronjob::handler::{AdmissionDecision, AdmissionHandler, AdmissionRequest};

fn get_builder(key: &str, crt: &str) -> anyhow::Result<SslAcceptorBuilder> {
    let mut builder = SslAcceptor::mozilla_intermediate(SslMethod::tls())?;
    builder
        .set_private_key_file(key, SslFiletype::PEM)
        .with_context(|| format!("failed to load TLS private key file {}", key))?;
    builder
        .set_certificate_chain_file(crt)
        .with_context(|| format!("failed to load TLS certificate file {}", crt))?;
    Ok(builder)
}

/// Both objects are decoded at the version of the requested resource.
fn to_admission_request(
    request: &ReviewRequest<DynamicObject>,
) -> Result<AdmissionRequest, serde_json::Error> {
    Ok(AdmissionRequest {
        operation: request.operation.clone(),
        object: request.object.as_ref().map(serde_json::to_vec).transpose()?,
        version: request.resource.version.clone(),
        old_object: request
            .old_object
            .as_ref()
            .map(serde_json::to_vec)
            .transpose()?,
        old_version: request.resource.version.clone(),
    })
}

fn to_response(
    request: &ReviewRequest<DynamicObject>,
    decision: AdmissionDecision,
) -> AdmissionResponse {
    let response = AdmissionResponse::from(request);
    match decision {
        AdmissionDecision::Allowed => response,
        AdmissionDecision::Rejected { code, message } => {
            let mut response = response.deny(message);
            response.result.code = code;
            response
        }
    }
}

#[post("/validate")]
async fn validate(
    handler: web::Data<AdmissionHandler>,
    review: web::Json<AdmissionReview<DynamicObject>>,
) -> impl Responder {
    let request: ReviewRequest<DynamicObject> = match review.into_inner().try_into() {
        Ok(request) => request,
        Err(e) => {
            log::warn!("validate - invalid AdmissionReview: {}", e);
            return HttpResponse::BadRequest().body("");
        }
    };
    log::trace!(
        "validate - {:?} of {}/{} ({})",
        request.operation,
        request.namespace.as_deref().unwrap_or_default(),
        request.name,
        request.uid
    );

    let decision = match to_admission_request(&request) {
        Ok(admission_request) => handler.handle(&admission_request),
        Err(e) => AdmissionDecision::Rejected {
            code: webhook_advancedcronjob::handler::BAD_REQUEST,
            message: e.to_string(),
        },
    };
    HttpResponse::Ok().json(to_response(&request, decision).into_review())
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::try_init()?;

    let matches = Command::new("AdvancedCronJob Webhook")
        .arg(
            Arg::new("crt_file")
                .long("tls-crt-file")
                .required(true)
                .help("TLS certificate file"),
        )
        .arg(
            Arg::new("key_file")
                .long("tls-key-file")
                .required(true)
                .help("TLS private key file"),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .value_parser(clap::value_parser!(u16))
                .default_value("8443")
                .help("port"),
        )
        .get_matches();

    let crt_file = matches
        .get_one::<String>("crt_file")
        .context("TLS certificate file")?;
    let key_file = matches
        .get_one::<String>("key_file")
        .context("TLS private key file")?;
    let port = *matches.get_one::<u16>("port").context("valid port [0-65535]")?;

    let endpoint = format!("0.0.0.0:{}", port);
    log::info!("main - starting AdvancedCronJob webhook server on {}", endpoint);

    let builder = get_builder(key_file, crt_file)?;
    let handler = web::Data::new(AdmissionHandler::default());
    HttpServer::new(move || App::new().app_data(handler.clone()).service(validate))
        .bind_openssl(endpoint, builder)?
        .run()
        .await?;
    Ok(())
}
