diesel::table! {
    cats (token_id) {
        token_id -> Int8,
        creator -> Text,
        name -> Nullable<Text>,
        city -> Nullable<Text>,
        country -> Nullable<Text>,
        latitude -> Nullable<Float8>,
        longitude -> Nullable<Float8>,
        metadata -> Jsonb,
        cid -> Text,
        created_at -> Timestamp,
    }
}

diesel::table! {
    likes (token_id, user_address) {
        token_id -> Int8,
        user_address -> Text,
        created_at -> Timestamp,
    }
}

diesel::table! {
    users (address) {
        address -> Text,
        username -> Nullable<Text>,
        ens -> Nullable<Text>,
    }
}

diesel::allow_tables_to_appear_in_same_query!(cats, likes, users);
