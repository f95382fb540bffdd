//! Integration tests for the resolver cascade using wiremock HTTP mocks.
//!
//! Each source gets its own mock server so `expect(..)` doubles as a
//! call-count assertion on the cascade.

use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rotacep_core::GeocodeSource;
use rotacep_geocode::{CepResolver, ResolverConfig};

const CEP: &str = "01310100";

struct MockSources {
    scrape: MockServer,
    awesome: MockServer,
    brasil: MockServer,
    viacep: MockServer,
    nominatim: MockServer,
}

impl MockSources {
    async fn start() -> Self {
        Self {
            scrape: MockServer::start().await,
            awesome: MockServer::start().await,
            brasil: MockServer::start().await,
            viacep: MockServer::start().await,
            nominatim: MockServer::start().await,
        }
    }

    fn resolver(&self, with_scrape: bool) -> CepResolver {
        let config = ResolverConfig {
            scrape_base_url: with_scrape.then(|| self.scrape.uri()),
            awesome_base_url: self.awesome.uri(),
            brasil_base_url: self.brasil.uri(),
            viacep_base_url: self.viacep.uri(),
            nominatim_base_url: self.nominatim.uri(),
            // No pacing in tests; the mock geocoder has no usage policy.
            geocode_min_interval_ms: 0,
            ..ResolverConfig::default()
        };
        CepResolver::new(config).expect("resolver construction should not fail")
    }
}

fn awesome_body() -> serde_json::Value {
    serde_json::json!({
        "cep": "01310100",
        "lat": "-23.5613",
        "lng": "-46.6565",
        "district": "Bela Vista",
        "address": "Avenida Paulista"
    })
}

#[tokio::test]
async fn first_usable_source_short_circuits_the_cascade() {
    let sources = MockSources::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/json/{CEP}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(awesome_body()))
        .expect(1)
        .mount(&sources.awesome)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(".*"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&sources.brasil)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(".*"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&sources.viacep)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(".*"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&sources.nominatim)
        .await;

    let resolver = sources.resolver(false);
    let record = resolver.resolve(CEP).await.expect("should resolve");

    assert_eq!(record.source, GeocodeSource::AwesomeApi);
    assert_eq!(record.postal_code, CEP);
    assert_eq!(record.neighborhood.as_deref(), Some("Bela Vista"));
    let coordinate = record.coordinate.expect("usable record has a coordinate");
    assert!((coordinate.latitude + 23.5613).abs() < 1e-9);
    assert!((coordinate.longitude + 46.6565).abs() < 1e-9);
}

#[tokio::test]
async fn cascade_falls_through_to_the_address_lookup_fallback() {
    let sources = MockSources::start().await;

    // Source 2: hard failure.
    Mock::given(method("GET"))
        .and(path(format!("/json/{CEP}")))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&sources.awesome)
        .await;
    // Source 3: reachable but without coordinates.
    Mock::given(method("GET"))
        .and(path(format!("/api/cep/v2/{CEP}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "cep": "01310100",
            "neighborhood": "Bela Vista"
        })))
        .expect(1)
        .mount(&sources.brasil)
        .await;
    // Source 4a: the address lookup succeeds…
    Mock::given(method("GET"))
        .and(path(format!("/ws/{CEP}/json/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "cep": "01310-100",
            "logradouro": "Avenida Paulista",
            "bairro": "Bela Vista",
            "localidade": "São Paulo",
            "uf": "SP"
        })))
        .expect(1)
        .mount(&sources.viacep)
        .await;
    // …and 4b geocodes it.
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "lat": "-23.5613", "lon": "-46.6565", "display_name": "Avenida Paulista" }
        ])))
        .expect(1)
        .mount(&sources.nominatim)
        .await;

    let resolver = sources.resolver(false);
    let record = resolver.resolve(CEP).await.expect("fallback should resolve");

    assert_eq!(record.source, GeocodeSource::ViaCepNominatim);
    assert_eq!(record.neighborhood.as_deref(), Some("Bela Vista"));
    assert_eq!(record.street.as_deref(), Some("Avenida Paulista"));
    let coordinate = record.coordinate.expect("usable record has a coordinate");
    assert!((coordinate.latitude + 23.5613).abs() < 1e-9);
}

#[tokio::test]
async fn partial_record_is_treated_as_a_source_failure() {
    let sources = MockSources::start().await;

    // Coordinates but no district: unusable, must not short-circuit.
    Mock::given(method("GET"))
        .and(path(format!("/json/{CEP}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "cep": "01310100",
            "lat": "-23.5613",
            "lng": "-46.6565"
        })))
        .expect(1)
        .mount(&sources.awesome)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/api/cep/v2/{CEP}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "cep": "01310100",
            "neighborhood": "Bela Vista",
            "street": "Avenida Paulista",
            "location": { "coordinates": { "latitude": "-23.5613", "longitude": "-46.6565" } }
        })))
        .expect(1)
        .mount(&sources.brasil)
        .await;

    let resolver = sources.resolver(false);
    let record = resolver.resolve(CEP).await.expect("should resolve via source 3");
    assert_eq!(record.source, GeocodeSource::BrasilApi);
}

#[tokio::test]
async fn configured_scrape_source_runs_first() {
    let sources = MockSources::start().await;

    let page = r#"
        <html><body>
        <table>
          <tr class="info"><th>CEP</th><th>Street</th><th>Neighborhood</th></tr>
          <tr><td>01310-100</td><td>Avenida Paulista</td><td>Bela Vista</td></tr>
        </table>
        <h4>Latitude: -23.5613 Longitude: -46.6565</h4>
        </body></html>
    "#;
    Mock::given(method("GET"))
        .and(path(format!("/busca-cep/{CEP}/")))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .expect(1)
        .mount(&sources.scrape)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(".*"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&sources.awesome)
        .await;

    let resolver = sources.resolver(true);
    let record = resolver.resolve(CEP).await.expect("scrape should resolve");

    assert_eq!(record.source, GeocodeSource::Scrape);
    assert_eq!(record.street.as_deref(), Some("Avenida Paulista"));
    assert_eq!(record.neighborhood.as_deref(), Some("Bela Vista"));
}

#[tokio::test]
async fn unresolvable_code_returns_none_after_exhausting_every_source() {
    let sources = MockSources::start().await;

    Mock::given(method("GET"))
        .and(path_regex(".*"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&sources.awesome)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(".*"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&sources.brasil)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(".*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"erro": true})))
        .expect(1)
        .mount(&sources.viacep)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(".*"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&sources.nominatim)
        .await;

    let resolver = sources.resolver(false);
    assert_eq!(resolver.resolve(CEP).await, None);
}

#[tokio::test]
async fn malformed_postal_code_makes_no_network_calls() {
    let sources = MockSources::start().await;

    for server in [
        &sources.awesome,
        &sources.brasil,
        &sources.viacep,
        &sources.nominatim,
    ] {
        Mock::given(method("GET"))
            .and(path_regex(".*"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(server)
            .await;
    }

    let resolver = sources.resolver(false);
    assert_eq!(resolver.resolve("1310-10").await, None);
    assert_eq!(resolver.resolve("not-a-cep").await, None);
}
