//! Table definitions, applied in order by `PostgresDatabase::migrate`.

pub(super) const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS cluster (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        admin_api_endpoint TEXT NOT NULL,
        admin_api_key_name TEXT NOT NULL,
        admin_api_key_secret TEXT NOT NULL,
        bootstrap_endpoint TEXT NOT NULL,
        organization_id TEXT NOT NULL,
        environment_id TEXT NOT NULL,
        schema_registry_id TEXT,
        schema_registry_api_endpoint TEXT,
        schema_registry_api_key_name TEXT,
        schema_registry_api_key_secret TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS service_account (
        id TEXT PRIMARY KEY,
        capability_id TEXT NOT NULL UNIQUE,
        user_account_id TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cluster_access (
        id UUID PRIMARY KEY,
        service_account_id TEXT NOT NULL REFERENCES service_account(id),
        user_account_id TEXT NOT NULL,
        cluster_id TEXT NOT NULL,
        capability_id TEXT NOT NULL,
        api_key_name TEXT NOT NULL DEFAULT '',
        api_key_secret TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (capability_id, cluster_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS acl (
        id UUID PRIMARY KEY,
        cluster_access_id UUID NOT NULL REFERENCES cluster_access(id) ON DELETE CASCADE,
        position INTEGER NOT NULL,
        resource_type TEXT NOT NULL,
        resource_name TEXT NOT NULL,
        pattern_type TEXT NOT NULL,
        operation_type TEXT NOT NULL,
        permission_type TEXT NOT NULL,
        created_at TIMESTAMPTZ
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS topic (
        id TEXT PRIMARY KEY,
        capability_id TEXT NOT NULL,
        cluster_id TEXT NOT NULL,
        name TEXT NOT NULL,
        partitions INTEGER NOT NULL,
        retention_ms BIGINT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS create_process (
        id UUID PRIMARY KEY,
        capability_id TEXT NOT NULL,
        cluster_id TEXT NOT NULL,
        topic_id TEXT NOT NULL,
        topic_name TEXT NOT NULL,
        partitions INTEGER NOT NULL,
        retention_ms BIGINT NOT NULL,
        has_service_account BOOLEAN NOT NULL DEFAULT FALSE,
        has_cluster_access BOOLEAN NOT NULL DEFAULT FALSE,
        has_api_key BOOLEAN NOT NULL DEFAULT FALSE,
        has_api_key_in_vault BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        completed_at TIMESTAMPTZ
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS delete_process (
        id UUID PRIMARY KEY,
        topic_id TEXT NOT NULL,
        capability_id TEXT NOT NULL,
        cluster_id TEXT NOT NULL,
        topic_name TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        completed_at TIMESTAMPTZ
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS schema_process (
        id UUID PRIMARY KEY,
        message_contract_id TEXT NOT NULL UNIQUE,
        topic_id TEXT NOT NULL,
        message_type TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        schema TEXT NOT NULL,
        schema_version INTEGER NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        completed_at TIMESTAMPTZ
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS outbox (
        sequence BIGSERIAL,
        id UUID PRIMARY KEY,
        topic TEXT NOT NULL,
        partition_key TEXT NOT NULL,
        payload TEXT NOT NULL,
        occurred_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        processed_at TIMESTAMPTZ
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_acl_cluster_access ON acl(cluster_access_id, position)",
    "DROP INDEX IF EXISTS idx_create_process_open",
    "CREATE UNIQUE INDEX IF NOT EXISTS uq_create_process_open ON create_process(capability_id, cluster_id, topic_name) WHERE completed_at IS NULL",
    "CREATE UNIQUE INDEX IF NOT EXISTS uq_delete_process_open ON delete_process(topic_id) WHERE completed_at IS NULL",
    "CREATE INDEX IF NOT EXISTS idx_schema_process_topic ON schema_process(topic_id)",
    "CREATE INDEX IF NOT EXISTS idx_outbox_unprocessed ON outbox(sequence) WHERE processed_at IS NULL",
];
