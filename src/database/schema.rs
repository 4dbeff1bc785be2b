// Mirrors the table created by `create_inventory_table`.

diesel::table! {
    casperimport (id) {
        id -> Integer,
        serial -> Nullable<Text>,
        name -> Nullable<Text>,
        model -> Nullable<Text>,
        ios_version -> Nullable<Text>,
        #[sql_name = "ipaddress"]
        ip_address -> Nullable<Text>,
        #[sql_name = "macaddress"]
        mac_address -> Nullable<Text>,
        #[sql_name = "bluetooth"]
        bluetooth_mac -> Nullable<Text>,
        capacity -> Nullable<Text>,
        username -> Nullable<Text>,
        email -> Nullable<Text>,
        asset_tag -> Nullable<Text>,
    }
}
