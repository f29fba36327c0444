use courier_customers::{
    adapter::{new_outbound, register_inbound, register_outbound, INBOUND_NAMESPACE},
    memory::InMemoryOutbound,
    Address, Customer, CustomerService, Error, GetCustomerArgs, Inbound,
};
use courier_fabric::{
    codec::MsgPackCodec,
    error::TransportError,
    transport::{HttpTransport, LocalTransport},
    Adapter, Config, Invoker,
};
use std::net::SocketAddr;
use std::sync::Arc;

fn customer(id: i64) -> Customer {
    Customer {
        id,
        first_name: "Grace".to_string(),
        middle_name: Some("Brewster".to_string()),
        last_name: "Hopper".to_string(),
        email: "grace@example.com".to_string(),
        address: Address {
            line1: "1 Navy Way".to_string(),
            line2: None,
            city: "Arlington".to_string(),
            state: "VA".to_string(),
            zip: "22202".to_string(),
        },
    }
}

fn loopback_config(path_prefix: &str, remote: &str) -> Config {
    let mut config = Config::default();
    config.listen.host = "127.0.0.1".to_string();
    config.listen.port = 0;
    config.listen.path_prefix = path_prefix.to_string();
    config.remote.base_url = remote.to_string();
    config
}

/// Bind the adapter on a free port and serve it in the background
async fn serve(adapter: &Adapter) -> SocketAddr {
    let listener = adapter.bind().await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(listener.serve());
    addr
}

#[tokio::test]
async fn create_saves_then_announces() {
    let store = Arc::new(InMemoryOutbound::new());
    let service = CustomerService::new(store.clone());

    let created = service.create_customer(customer(1)).await.unwrap();

    assert_eq!(created, customer(1));
    assert_eq!(store.len(), 1);
    assert_eq!(store.created(), vec![1]);
}

#[tokio::test]
async fn get_reads_through_outbound() {
    let store = Arc::new(InMemoryOutbound::new());
    let service = CustomerService::new(store.clone());
    service.create_customer(customer(7)).await.unwrap();

    assert_eq!(service.get_customer(7).await.unwrap(), customer(7));
    match service.get_customer(8).await {
        Err(Error::NotFound(8)) => {}
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn unimplemented_inbound_operations_fail() {
    struct Nothing;
    impl Inbound for Nothing {}

    match Nothing.create_customer(customer(1)).await {
        Err(Error::NotImplemented(name)) => assert_eq!(name, "createCustomer"),
        other => panic!("Expected NotImplemented, got {:?}", other),
    }
    match Nothing.get_customer(1).await {
        Err(Error::NotImplemented(name)) => assert_eq!(name, "getCustomer"),
        other => panic!("Expected NotImplemented, got {:?}", other),
    }
}

#[tokio::test]
async fn in_process_composition() {
    // Peer serving the outbound capability
    let peer = Adapter::new(loopback_config("", "http://127.0.0.1:1")).unwrap();
    let store = Arc::new(InMemoryOutbound::new());
    register_outbound(&peer, store.clone()).unwrap();

    // Service whose outbound calls land directly in the peer's table
    let service = Adapter::with_transport(
        loopback_config("", "http://127.0.0.1:1"),
        MsgPackCodec,
        Arc::new(LocalTransport::new(peer.handlers().clone())),
    )
    .unwrap();
    let outbound = Arc::new(new_outbound(&service));
    register_inbound(&service, Arc::new(CustomerService::new(outbound))).unwrap();

    let client = Invoker::local(service.handlers().clone(), MsgPackCodec);
    let created: Customer = client
        .invoke_with_return(INBOUND_NAMESPACE, "createCustomer", &customer(3))
        .await
        .unwrap();
    assert_eq!(created, customer(3));
    assert_eq!(store.created(), vec![3]);

    let fetched: Customer = client
        .invoke_with_return(INBOUND_NAMESPACE, "getCustomer", &GetCustomerArgs { id: 3 })
        .await
        .unwrap();
    assert_eq!(fetched, customer(3));
}

#[tokio::test]
async fn negative_ids_are_accepted() {
    let peer = Adapter::new(loopback_config("", "http://127.0.0.1:1")).unwrap();
    let store = Arc::new(InMemoryOutbound::new());
    register_outbound(&peer, store.clone()).unwrap();

    let service = Adapter::with_transport(
        loopback_config("", "http://127.0.0.1:1"),
        MsgPackCodec,
        Arc::new(LocalTransport::new(peer.handlers().clone())),
    )
    .unwrap();
    let outbound = Arc::new(new_outbound(&service));
    register_inbound(&service, Arc::new(CustomerService::new(outbound))).unwrap();

    let client = Invoker::local(service.handlers().clone(), MsgPackCodec);
    client
        .invoke(INBOUND_NAMESPACE, "createCustomer", &customer(-42))
        .await
        .unwrap();
    assert_eq!(store.created(), vec![-42]);

    let fetched: Customer = client
        .invoke_with_return(INBOUND_NAMESPACE, "getCustomer", &GetCustomerArgs { id: -42 })
        .await
        .unwrap();
    assert_eq!(fetched, customer(-42));
}

#[tokio::test]
async fn round_trip_between_two_peers_over_http() {
    // Peer serving the outbound capability under /outbound
    let peer = Adapter::new(loopback_config("/outbound", "http://127.0.0.1:1")).unwrap();
    let store = Arc::new(InMemoryOutbound::new());
    register_outbound(&peer, store.clone()).unwrap();
    let peer_addr = serve(&peer).await;

    // Service calling that peer
    let service = Adapter::new(loopback_config(
        "",
        &format!("http://{peer_addr}/outbound"),
    ))
    .unwrap();
    let outbound = Arc::new(new_outbound(&service));
    register_inbound(&service, Arc::new(CustomerService::new(outbound))).unwrap();
    let service_addr = serve(&service).await;

    let transport = HttpTransport::builder()
        .base_url(format!("http://{service_addr}"))
        .build()
        .unwrap();
    let client = Invoker::new(Arc::new(transport), MsgPackCodec);

    let created: Customer = client
        .invoke_with_return(INBOUND_NAMESPACE, "createCustomer", &customer(11))
        .await
        .unwrap();
    assert_eq!(created, customer(11));
    assert_eq!(store.created(), vec![11]);

    let fetched: Customer = client
        .invoke_with_return(INBOUND_NAMESPACE, "getCustomer", &GetCustomerArgs { id: 11 })
        .await
        .unwrap();
    assert_eq!(fetched, customer(11));

    // A failure on the peer comes back as a server error through both hops
    let missing: Result<Customer, _> = client
        .invoke_with_return(INBOUND_NAMESPACE, "getCustomer", &GetCustomerArgs { id: 99 })
        .await;
    match missing {
        Err(courier_fabric::Error::Transport(TransportError::Status { status, body })) => {
            assert_eq!(status, 500);
            assert!(body.contains("99"));
        }
        other => panic!("Expected HTTP 500, got {:?}", other),
    }
}

#[tokio::test]
async fn unreachable_peer_surfaces_as_rpc_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let service = Adapter::new(loopback_config("", &format!("http://{addr}/outbound"))).unwrap();
    let outbound = new_outbound(&service);
    let service = CustomerService::new(Arc::new(outbound));

    match service.create_customer(customer(5)).await {
        Err(Error::Rpc(err)) => assert!(err.is_transport()),
        other => panic!("Expected RPC error, got {:?}", other),
    }
}

#[test]
fn malformed_outbound_url_aborts_startup() {
    let result = Adapter::new(loopback_config("", "::not a url::"));
    assert!(matches!(result, Err(courier_fabric::Error::Configuration(_))));
}

#[test]
fn unsupported_transport_flag_aborts_startup() {
    let mut config = loopback_config("", "http://127.0.0.1:1");
    config.transport.tls = true;
    assert!(matches!(
        Adapter::new(config),
        Err(courier_fabric::Error::Configuration(_))
    ));
}
